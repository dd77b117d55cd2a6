//! Diagnostic rendering
//!
//! Converts compiler and assembler errors into `codespan-reporting`
//! diagnostics labelled against the original input files.

use crate::sources::SourceSet;
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use pico_bytecode::AsmError;
use pico_compiler::CompileError;
use pico_parser::{LexError, Span};
use termcolor::{Buffer, ColorChoice, StandardStream, WriteColor};

/// Renders diagnostics for one set of inputs.
pub struct Reporter<'a> {
    sources: &'a SourceSet,
    files: SimpleFiles<String, String>,
    config: term::Config,
}

impl<'a> Reporter<'a> {
    pub fn new(sources: &'a SourceSet) -> Self {
        let mut files = SimpleFiles::new();
        for file in sources.files() {
            files.add(file.name.clone(), file.text.clone());
        }
        Self {
            sources,
            files,
            config: term::Config::default(),
        }
    }

    /// Diagnostics for a compilation failure, one per reported problem.
    pub fn compile_error(&self, error: &CompileError) -> Vec<Diagnostic<usize>> {
        match error {
            CompileError::Lex { errors, .. } => errors
                .iter()
                .map(|error| self.at_span(Diagnostic::error().with_message(lex_message(error)), error.span()))
                .collect(),
            CompileError::Parse { error, .. } => {
                vec![self.at_span(Diagnostic::error().with_message(&error.message), error.span)]
            }
            CompileError::Semantic { error, .. } => vec![self.at_span(
                Diagnostic::error().with_message(error.kind.to_string()),
                error.span,
            )],
            CompileError::Internal { message } => vec![Diagnostic::bug()
                .with_message(format!("internal compiler error: {}", message))],
        }
    }

    /// Diagnostic for an assembly failure.
    pub fn asm_error(&self, error: &AsmError) -> Diagnostic<usize> {
        let (message, label) = match error {
            AsmError::Syntax { message, .. } => (message.clone(), "here"),
            AsmError::UnknownMnemonic { mnemonic, .. } => {
                (format!("unknown mnemonic '{}'", mnemonic), "not an instruction")
            }
            AsmError::OperandOutOfRange { value, min, max, .. } => (
                format!("operand {} out of range {}..={}", value, min, max),
                "operand too wide",
            ),
            AsmError::DuplicateLabel { label, .. } => {
                (format!("duplicate label '{}'", label), "defined again here")
            }
            AsmError::UndefinedLabel { label, .. } => {
                (format!("undefined label '{}'", label), "referenced here")
            }
        };

        let diagnostic = Diagnostic::error().with_message(message);
        match self.sources.locate_line(error.line()) {
            Some((file, range)) => diagnostic.with_labels(vec![Label::primary(file, range).with_message(label)]),
            None => diagnostic.with_notes(vec![format!("at line {}", error.line() + 1)]),
        }
    }

    fn at_span(&self, diagnostic: Diagnostic<usize>, span: Span) -> Diagnostic<usize> {
        let start = self.sources.locate_offset(span.start);
        let end = self.sources.locate_offset(span.end);
        match (start, end) {
            (Some((file, start)), Some((end_file, end))) if file == end_file => {
                diagnostic.with_labels(vec![Label::primary(file, start..end.max(start))])
            }
            (Some((file, start)), _) => diagnostic.with_labels(vec![Label::primary(file, start..start)]),
            _ => diagnostic.with_notes(vec![format!("at {}:{}", span.line, span.column)]),
        }
    }

    pub fn emit_to(&self, writer: &mut dyn WriteColor, diagnostic: &Diagnostic<usize>) -> anyhow::Result<()> {
        term::emit(writer, &self.config, &self.files, diagnostic)?;
        Ok(())
    }

    /// Write diagnostics to stderr.
    pub fn emit(&self, diagnostics: &[Diagnostic<usize>], choice: ColorChoice) -> anyhow::Result<()> {
        let writer = StandardStream::stderr(choice);
        let mut lock = writer.lock();
        for diagnostic in diagnostics {
            self.emit_to(&mut lock, diagnostic)?;
        }
        Ok(())
    }

    /// Render without color, for tests and logs.
    pub fn render(&self, diagnostic: &Diagnostic<usize>) -> anyhow::Result<String> {
        let mut buffer = Buffer::no_color();
        self.emit_to(&mut buffer, diagnostic)?;
        Ok(String::from_utf8_lossy(buffer.as_slice()).into_owned())
    }
}

fn lex_message(error: &LexError) -> String {
    match error {
        LexError::UnexpectedCharacter { char, .. } => format!("unexpected character '{}'", char),
        LexError::InvalidNumber { text, .. } => format!("invalid number '{}'", text),
        LexError::UnterminatedString { .. } => "unterminated string".to_string(),
        LexError::InvalidCharLiteral { .. } => "invalid character literal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pico_compiler::{compile, CompileOptions};

    fn sources(text: &str) -> SourceSet {
        let mut set = SourceSet::new();
        set.add("main.pico", text);
        set
    }

    #[test]
    fn test_semantic_error_points_at_identifier() {
        let set = sources("x = 1\ny + x\n");
        let err = compile(set.text(), set.unit_name(), &CompileOptions::default()).unwrap_err();
        let reporter = Reporter::new(&set);
        let diagnostics = reporter.compile_error(&err);
        assert_eq!(diagnostics.len(), 1);

        let text = reporter.render(&diagnostics[0]).unwrap();
        assert!(text.contains("error: unknown identifier 'y'"), "{}", text);
        assert!(text.contains("main.pico:2:1"), "{}", text);
    }

    #[test]
    fn test_error_in_second_file() {
        let mut set = SourceSet::new();
        set.add("lib.pico", "def f(x) x\n");
        set.add("main.pico", "f(1, 2)\n");
        let err = compile(set.text(), set.unit_name(), &CompileOptions::default()).unwrap_err();
        let reporter = Reporter::new(&set);
        let text = reporter.render(&reporter.compile_error(&err)[0]).unwrap();
        assert!(text.contains("main.pico:1:1"), "{}", text);
    }

    #[test]
    fn test_lex_errors_each_reported() {
        let set = sources("x = $ + #");
        let err = compile(set.text(), set.unit_name(), &CompileOptions::default()).unwrap_err();
        let diagnostics = Reporter::new(&set).compile_error(&err);
        assert!(!diagnostics.is_empty());
        assert!(diagnostics[0].message.starts_with("unexpected character"));
    }

    #[test]
    fn test_asm_error_labels_line() {
        let set = sources("start: HLT\nSTART: HLT\n");
        let err = pico_bytecode::assemble(set.text(), 0).unwrap_err();
        let reporter = Reporter::new(&set);
        let text = reporter.render(&reporter.asm_error(&err)).unwrap();
        assert!(text.contains("duplicate label 'START'"), "{}", text);
        assert!(text.contains("main.pico:2:1"), "{}", text);
    }
}

//! picolang compiler
//!
//! Compiles picolang source into picovm assembly text:
//!
//! 1. parse (`pico-parser`)
//! 2. constant folding
//! 3. parent links
//! 4. name resolution, type inference and monomorphization
//! 5. lowering to a linked instruction list
//! 6. peephole optimization
//! 7. finalization and emission
//!
//! Steps 2 and 6 are skipped when optimization is off.

pub mod context;
pub mod emit;
pub mod error;
pub mod fold;
pub mod infer;
pub mod ir;
pub mod lower;
pub mod optimize;
pub mod symbols;

pub use context::CompilerContext;
pub use error::{CompileError, CompileResult, SemanticError, SemanticErrorKind};
pub use fold::ConstantFolder;
pub use ir::IrProgram;
pub use optimize::{OptStats, Optimizer};

use pico_parser::Parser;
use tracing::{debug, debug_span};

/// Compiler configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Run constant folding and the peephole optimizer
    pub optimize: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { optimize: true }
    }
}

/// Everything produced by compiling one unit
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    /// Assembly text, code followed by global storage
    pub assembly: String,
    /// Finalized instruction list
    pub program: IrProgram,
    /// Decorated names of the emitted function instances, in emission order
    pub functions: Vec<String>,
    /// Peephole statistics, when optimization ran
    pub stats: Option<OptStats>,
}

/// Main compiler entry point
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile `source` to assembly text.
    pub fn compile(&self, source: &str, file_name: &str) -> CompileResult<String> {
        Ok(self.compile_unit(source, file_name)?.assembly)
    }

    /// Compile `source`, keeping the intermediate results.
    pub fn compile_unit(&self, source: &str, file_name: &str) -> CompileResult<CompiledUnit> {
        let _span = debug_span!("compile", file = file_name).entered();

        let parser = Parser::new(source).map_err(|errors| CompileError::Lex {
            file: file_name.to_string(),
            errors,
        })?;
        let mut ast = parser.parse().map_err(|error| CompileError::Parse {
            file: file_name.to_string(),
            error,
        })?;

        if self.options.optimize {
            ConstantFolder::new().run(&mut ast);
        }

        let mut ctx = CompilerContext::new(file_name, ast);
        let root = ctx.root()?;
        ctx.ast.link_parents(root, None);

        infer::infer_types(&mut ctx)?;
        let mut program = lower::lower(&mut ctx)?;

        let stats = self
            .options
            .optimize
            .then(|| Optimizer::new().optimize(&mut program).clone());
        optimize::finalize(&mut program, &mut ctx.counters);

        let functions = program
            .iter()
            .filter_map(|id| match &program.get(id).op {
                ir::Op::Entry(name) => Some(name.clone()),
                _ => None,
            })
            .collect();

        let mut assembly = emit::emit_program(&program)?;
        assembly.push_str(&emit::emit_global_symbols(&mut ctx.symbols));

        debug!(
            instructions = program.len(),
            bytes = assembly.len(),
            "compilation finished"
        );
        Ok(CompiledUnit {
            assembly,
            program,
            functions,
            stats,
        })
    }
}

/// Compile one source file with the given options.
pub fn compile(source: &str, file_name: &str, options: &CompileOptions) -> CompileResult<String> {
    Compiler::new(options.clone()).compile(source, file_name)
}

// Report token parsing: token discovery, instruction splitting, formatting
// options, and the small shared value grammars.

pub mod formatting;
pub mod instruction;
pub mod scanner;
pub mod values;

// Public API re-exports
pub use formatting::Formatting;
pub use instruction::InstructionSet;
pub use scanner::{scan, Token, TokenScanner};

pub mod display;
pub mod list;
pub mod template;
pub mod term;

pub use template::ClauseTemplate;
pub use term::{Compound, HostObject, Tag, Term, TermError, VarId};

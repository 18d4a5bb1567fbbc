//! SPIR-V code generation for a structured SSA shader IR.
//!
//! The [`ir`] module holds the input representation and its builder; the
//! [`spirv`] module lowers a validated [`ir::Module`] to a SPIR-V word stream.

pub mod error;
pub mod ice;
pub mod ir;
pub mod spirv;

use std::marker::PhantomData;

// =============================================================================
// Generic ID allocation
// =============================================================================

/// Generic counter for generating unique IDs.
///
/// The ID type must implement `From<u32>` to convert the raw counter value.
#[derive(Debug, Clone)]
pub struct IdSource<Id> {
    next_id: u32,
    _phantom: PhantomData<Id>,
}

impl<Id: From<u32>> IdSource<Id> {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// A counter whose first handed-out ID is `first`.
    pub fn starting_at(first: u32) -> Self {
        IdSource {
            next_id: first,
            _phantom: PhantomData,
        }
    }

    pub fn next(&mut self) -> Id {
        let id = Id::from(self.next_id);
        self.next_id += 1;
        id
    }

    /// One past the last ID handed out.
    pub fn bound(&self) -> u32 {
        self.next_id
    }
}

impl<Id: From<u32>> Default for IdSource<Id> {
    fn default() -> Self {
        Self::new()
    }
}

pub use error::{CompilerError, Result};
pub use spirv::{Options, generate, generate_module};

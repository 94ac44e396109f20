pub mod composition;
pub mod config;
pub mod controller;
pub mod error;
pub mod markup;
pub mod mention;
pub mod reconcile;
pub mod syntax;
pub mod text;

pub use composition::{CompositionChanged, CompositionSession, CompositionState};
pub use config::{MentionSettings, SyntaxConfig, load_settings};
pub use controller::{CommitOutcome, EditOutcome, EditSource, MentionController};
pub use error::{MentionError, MentionResult};
pub use markup::{Decoded, decode, encode};
pub use mention::{
    MentionDirectory, MentionObject, MentionResolver, MentionSpan, Segment, segments,
};
pub use reconcile::ReconcileOutcome;
pub use syntax::{MentionSyntax, SyntaxRegistry};
pub use text::{DiffAlgorithm, DiffOp};

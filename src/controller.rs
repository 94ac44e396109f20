//! The single owner of a mention-aware buffer.
//!
//! A `MentionController` holds the current plain text, its mention spans and
//! the composition state. The host feeds it every buffer change through
//! [`MentionController::apply_edit`]; each call runs to completion and either
//! updates all three pieces of state or, on a precondition violation, none.

use crate::composition::{self, CompositionChanged, CompositionState};
use crate::config::MentionSettings;
use crate::config::defaults::default_registry;
use crate::error::{MentionError, MentionResult};
use crate::markup;
use crate::mention::{MentionObject, MentionResolver, MentionSpan, Segment, segments};
use crate::reconcile::{self, ReconcileOutcome};
use crate::syntax::{MentionSyntax, SyntaxRegistry};
use crate::text::diff::{DiffAlgorithm, diff_with};
use crate::text::offsets::{char_len, replace_chars};
use log::{debug, warn};
use std::sync::Arc;

/// Who changed the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditSource {
    /// A keystroke, paste or other edit by the user
    User,
    /// The host echoing a replacement the controller asked for
    Programmatic,
}

/// Listener for composition changes
pub type CompositionListener = Box<dyn FnMut(&CompositionChanged)>;

/// What the host needs to do after an edit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditOutcome {
    /// New buffer contents, if the controller excised invalidated mentions
    pub replacement: Option<String>,
    /// Caret position to apply along with `replacement`
    pub caret: Option<usize>,
    /// Mentions that stopped being valid with this edit
    pub removed: Vec<MentionSpan>,
}

/// Result of committing a mention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitOutcome {
    /// New buffer contents for the host
    pub text: String,
    /// Caret position right after the inserted mention
    pub caret: usize,
    pub span: MentionSpan,
}

pub struct MentionController {
    registry: SyntaxRegistry,
    diff_algorithm: DiffAlgorithm,
    text: String,
    spans: Vec<MentionSpan>,
    composition: CompositionState,
    listener: Option<CompositionListener>,
}

impl MentionController {
    pub fn new(registry: SyntaxRegistry) -> Self {
        Self {
            registry,
            diff_algorithm: DiffAlgorithm::default(),
            text: String::new(),
            spans: Vec::new(),
            composition: CompositionState::Inactive,
            listener: None,
        }
    }

    /// Build a controller from loaded settings.
    ///
    /// Fails if a syntax does not compile or two syntaxes share a trigger.
    pub fn from_settings(settings: &MentionSettings) -> MentionResult<Self> {
        let registry = settings.build_registry()?;
        Ok(Self::new(registry).with_diff_algorithm(settings.diff_algorithm()))
    }

    pub fn with_diff_algorithm(mut self, algorithm: DiffAlgorithm) -> Self {
        self.diff_algorithm = algorithm;
        self
    }

    /// Register the composition-changed listener, replacing any previous one.
    pub fn on_composition_changed(&mut self, listener: impl FnMut(&CompositionChanged) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn registry(&self) -> &SyntaxRegistry {
        &self.registry
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current spans, sorted by start and non-overlapping
    pub fn spans(&self) -> &[MentionSpan] {
        &self.spans
    }

    pub fn composition(&self) -> &CompositionState {
        &self.composition
    }

    /// The buffer as plain and mention runs
    pub fn segments(&self) -> Vec<Segment<'_>> {
        segments(&self.text, &self.spans)
    }

    /// Text typed after the starting character, while composing
    pub fn search_text(&self) -> Option<&str> {
        self.composition.session()?.search_text(&self.text)
    }

    /// Syntax being composed, while composing
    pub fn search_syntax(&self) -> Option<&Arc<MentionSyntax>> {
        self.composition.session().map(|session| &session.syntax)
    }

    /// Replace the buffer with decoded `markup`.
    pub fn load_markup<R>(&mut self, markup: &str, resolver: &R)
    where
        R: MentionResolver + ?Sized,
    {
        let decoded = markup::decode(markup, &self.registry, resolver);
        let previous = self.describe_composition();
        self.text = decoded.text;
        self.spans = decoded.spans;
        self.composition = CompositionState::Inactive;
        self.notify_if_changed(previous);
    }

    /// Serialize the buffer and its spans back to markup.
    pub fn export_markup(&self) -> String {
        markup::encode(&self.text, &self.spans)
    }

    /// Feed a buffer change from the host.
    pub fn apply_edit(&mut self, new_text: &str, source: EditSource) -> MentionResult<EditOutcome> {
        if new_text == self.text {
            return Ok(EditOutcome::default());
        }

        let (outcome, composition) = match source {
            EditSource::User => self.reconcile_user_edit(new_text)?,
            EditSource::Programmatic => {
                let outcome = reconcile::revalidate(&self.spans, new_text);
                let composition = match &self.composition {
                    CompositionState::Composing(session)
                        if session.reads_as_token_in(new_text) =>
                    {
                        self.composition.clone()
                    }
                    _ => CompositionState::Inactive,
                };
                (outcome, composition)
            }
        };

        debug!(
            target: "mentionkit::controller",
            "{:?} edit: {} span(s) kept, {} removed, composing={}",
            source,
            outcome.spans.len(),
            outcome.removed.len(),
            composition.is_composing()
        );

        let previous = self.describe_composition();
        let replacement = outcome.text_changed().then(|| outcome.text.clone());
        self.text = outcome.text;
        self.spans = outcome.spans;
        self.composition = composition;
        self.notify_if_changed(previous);

        Ok(EditOutcome {
            replacement,
            caret: outcome.caret,
            removed: outcome.removed,
        })
    }

    fn reconcile_user_edit(
        &self,
        new_text: &str,
    ) -> MentionResult<(ReconcileOutcome, CompositionState)> {
        let ops = diff_with(&self.text, new_text, self.diff_algorithm);
        let outcome = reconcile::reconcile(&ops, &self.spans, new_text);

        // An edit that destroys a mention never starts or continues a composition
        let composition = if outcome.removed_any() {
            CompositionState::Inactive
        } else {
            composition::advance(&self.composition, &ops, &self.registry, &outcome.text)?
        };
        Ok((outcome, composition))
    }

    /// Replace the token being composed with a mention of `object`.
    pub fn commit_mention(&mut self, object: &MentionObject) -> MentionResult<CommitOutcome> {
        let CompositionState::Composing(session) = &self.composition else {
            return Err(MentionError::NotComposing);
        };

        let run = session.syntax.display_run(&object.display_name);
        let run_len = char_len(&run);
        let mut text = self.text.clone();
        if !replace_chars(&mut text, session.start, session.end(), &run) {
            warn!(
                target: "mentionkit::controller",
                "Composed token [{}, {}) is outside the buffer",
                session.start,
                session.end()
            );
            return Err(MentionError::NotComposing);
        }

        let span = MentionSpan::new(
            object.id.clone(),
            &object.display_name,
            session.start,
            Arc::clone(&session.syntax),
        );
        let token_end = session.end();
        let token_len = session.length;
        let mut spans = std::mem::take(&mut self.spans);
        for existing in &mut spans {
            if existing.start >= token_end {
                existing.shift_backward(token_len);
                existing.shift_forward(run_len);
            }
        }
        spans.push(span.clone());
        spans.sort_by_key(|span| span.start);

        debug!(
            target: "mentionkit::controller",
            "Committed {} mention '{}' at [{}, {})",
            span.syntax.name(),
            span.id,
            span.start,
            span.end
        );

        let previous = self.describe_composition();
        self.text = text;
        self.spans = spans;
        self.composition = CompositionState::Inactive;
        self.notify_if_changed(previous);

        Ok(CommitOutcome {
            text: self.text.clone(),
            caret: span.end,
            span,
        })
    }

    /// End the current composition, if any. Always notifies the listener.
    pub fn cancel_composition(&mut self) {
        self.composition = CompositionState::Inactive;
        self.notify(&CompositionChanged::cancelled());
    }

    fn describe_composition(&self) -> CompositionChanged {
        CompositionChanged::describe(&self.composition, &self.text)
    }

    fn notify_if_changed(&mut self, previous: CompositionChanged) {
        let current = self.describe_composition();
        if current != previous {
            self.notify(&current);
        }
    }

    fn notify(&mut self, changed: &CompositionChanged) {
        if let Some(listener) = self.listener.as_mut() {
            listener(changed);
        }
    }
}

impl Default for MentionController {
    fn default() -> Self {
        Self::new(default_registry())
    }
}

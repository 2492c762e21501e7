//! Request-scoped draft context
//!
//! One `DraftContext` value is created per inbound request and threaded
//! explicitly to everything that needs to know the acting user or whether
//! drafts may be shown. There is no process-global state: concurrent
//! requests each own their context.
//!
//! Temporary changes go through the override guards, which restore the
//! previous value when dropped (including on early return or panic unwind).

use std::ops::{Deref, DerefMut};

use quire_core_types::{RequestContext, RequestId, TraceId};

use crate::model::User;

/// Per-request publishing state
#[derive(Debug, Clone, Default)]
pub struct DraftContext {
    request: RequestContext,
    current_user: Option<User>,
    publishing_active: bool,
    draft_request: bool,
}

impl DraftContext {
    /// An inactive context: no user, publishing layer off, not draft
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset for a new inbound request with a fresh `RequestId`
    pub fn begin_request(&mut self, user: Option<User>) {
        self.begin_request_with(RequestContext::new(), user);
    }

    /// Reset for a new inbound request, adopting upstream correlation
    pub fn begin_request_with(&mut self, request: RequestContext, user: Option<User>) {
        self.request = request;
        self.current_user = user;
        self.publishing_active = true;
        self.draft_request = false;
    }

    /// Tear down at request end
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request.request_id
    }

    /// Upstream trace the request belongs to
    pub fn trace_id(&self) -> Option<&TraceId> {
        self.request.trace_id.as_ref()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    /// Whether a publishing gate is handling the current request
    pub fn is_publishing_active(&self) -> bool {
        self.publishing_active
    }

    /// Whether the current request may see drafts
    pub fn is_draft_request(&self) -> bool {
        self.draft_request
    }

    pub(crate) fn set_draft_request(&mut self, draft: bool) {
        self.draft_request = draft;
    }

    /// Temporarily force the draft flag
    ///
    /// ```
    /// use quire_core::context::DraftContext;
    ///
    /// let mut ctx = DraftContext::new();
    /// {
    ///     let scoped = ctx.override_draft_request(true);
    ///     assert!(scoped.is_draft_request());
    /// }
    /// assert!(!ctx.is_draft_request());
    /// ```
    pub fn override_draft_request(&mut self, draft: bool) -> ContextOverride<'_> {
        let saved = Saved::DraftRequest(self.draft_request);
        self.draft_request = draft;
        ContextOverride { ctx: self, saved: Some(saved) }
    }

    /// Temporarily force the publishing-layer flag
    pub fn override_publishing_active(&mut self, active: bool) -> ContextOverride<'_> {
        let saved = Saved::PublishingActive(self.publishing_active);
        self.publishing_active = active;
        ContextOverride { ctx: self, saved: Some(saved) }
    }

    /// Temporarily act as another user
    pub fn override_current_user(&mut self, user: Option<User>) -> ContextOverride<'_> {
        let saved = Saved::CurrentUser(std::mem::replace(&mut self.current_user, user));
        ContextOverride { ctx: self, saved: Some(saved) }
    }
}

#[derive(Debug)]
enum Saved {
    DraftRequest(bool),
    PublishingActive(bool),
    CurrentUser(Option<User>),
}

/// Scoped override of one context value; restores it on drop
///
/// Dereferences to the context so overrides can be nested.
#[derive(Debug)]
pub struct ContextOverride<'a> {
    ctx: &'a mut DraftContext,
    saved: Option<Saved>,
}

impl Deref for ContextOverride<'_> {
    type Target = DraftContext;

    fn deref(&self) -> &DraftContext {
        &*self.ctx
    }
}

impl DerefMut for ContextOverride<'_> {
    fn deref_mut(&mut self) -> &mut DraftContext {
        &mut *self.ctx
    }
}

impl Drop for ContextOverride<'_> {
    fn drop(&mut self) {
        match self.saved.take() {
            Some(Saved::DraftRequest(value)) => self.ctx.draft_request = value,
            Some(Saved::PublishingActive(value)) => self.ctx.publishing_active = value,
            Some(Saved::CurrentUser(user)) => self.ctx.current_user = user,
            None => {}
        }
    }
}

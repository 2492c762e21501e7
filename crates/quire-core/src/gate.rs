//! Per-request publishing gate
//!
//! Classifies each request, decides whether it may see drafts, writes that
//! decision into the request's `DraftContext`, and redirects staff to
//! shareable signed URLs. Classification, in priority order:
//!
//! - `Admin`: path under the admin prefix; always draft
//! - `Reviewer`: member of the reviewer group; always draft
//! - `Staff`: draft when the edit parameter is present; an unsigned or
//!   invalid token is answered with a 302 to a freshly signed URL
//! - `Unprivileged`: draft only with a token valid for this exact path;
//!   an invalid token is ignored

use std::fmt;

use quire_core_types::{RequestContext, TraceId};
use url::{form_urlencoded, Url};

use crate::config::PublishingConfig;
use crate::context::DraftContext;
use crate::errors::{QuireError, Result};
use crate::model::User;
use crate::signing::{DraftUrlSigner, SecretStore};

const URI_BASE: &str = "http://quire.invalid/";

/// The parts of an inbound request the gate looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRequest {
    pub path: String,
    pub query: Vec<(String, String)>,
    pub user: Option<User>,
    /// Trace id received from upstream, if any
    pub trace_id: Option<TraceId>,
}

impl GateRequest {
    pub fn new(path: impl Into<String>, user: Option<User>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
            user,
            trace_id: None,
        }
    }

    /// Continue an upstream trace
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Fresh correlation for this request, joined to the upstream trace
    pub fn correlation(&self) -> RequestContext {
        match &self.trace_id {
            Some(trace_id) => RequestContext::new().with_trace_id(trace_id.clone()),
            None => RequestContext::new(),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Build from a request URI (path and query, or absolute)
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` if the URI cannot be parsed.
    pub fn from_uri(uri: &str, user: Option<User>) -> Result<Self> {
        let parsed = Url::parse(URI_BASE)
            .and_then(|base| base.join(uri))
            .map_err(|e| QuireError::InvalidUrl {
                url: uri.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            path: parsed.path().to_string(),
            query: parsed.query_pairs().into_owned().collect(),
            user,
            trace_id: None,
        })
    }

    /// Last value of a query parameter
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Path plus encoded query string
    pub fn full_path(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        format!("{}?{}", self.path, query)
    }
}

/// How the gate classified a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Admin,
    Reviewer,
    Staff,
    Unprivileged,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestKind::Admin => "admin",
            RequestKind::Reviewer => "reviewer",
            RequestKind::Staff => "staff",
            RequestKind::Unprivileged => "unprivileged",
        };
        f.write_str(name)
    }
}

/// Result of request processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Hand the request to the view
    Proceed { is_draft: bool },
    /// Answer with a 302 instead
    Redirect { location: String },
}

/// Minimal response as seen by the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateResponse {
    pub status: u16,
    pub location: Option<String>,
    pub body: Option<String>,
}

impl GateResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            location: None,
            body: Some(body.into()),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: 404,
            location: None,
            body: None,
        }
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        Self {
            status: 302,
            location: Some(location.into()),
            body: None,
        }
    }
}

/// Clears the context when the request scope ends, on every exit path
struct RequestScope<'c> {
    ctx: &'c mut DraftContext,
}

impl Drop for RequestScope<'_> {
    fn drop(&mut self) {
        self.ctx.clear();
    }
}

/// Draft-mode decision and redirects for inbound requests
pub struct PublishingGate<'a> {
    signer: DraftUrlSigner<'a>,
}

impl<'a> PublishingGate<'a> {
    pub fn new(secrets: &'a dyn SecretStore, config: PublishingConfig) -> Self {
        Self {
            signer: DraftUrlSigner::new(secrets, config),
        }
    }

    pub fn signer(&self) -> &DraftUrlSigner<'a> {
        &self.signer
    }

    fn config(&self) -> &PublishingConfig {
        self.signer.config()
    }

    pub fn is_admin_request(&self, req: &GateRequest) -> bool {
        req.path.starts_with(&self.config().admin_prefix)
    }

    /// Active staff user
    pub fn is_staff_user(&self, req: &GateRequest) -> bool {
        req.user
            .as_ref()
            .map_or(false, |u| u.is_active && u.is_staff)
    }

    /// Active member of the reviewer group
    pub fn is_content_reviewer(&self, req: &GateRequest) -> bool {
        req.user
            .as_ref()
            .map_or(false, |u| u.is_active && u.in_group(&self.config().reviewer_group))
    }

    /// Whether the edit parameter is present at all, valid or not
    pub fn is_draft_request(&self, req: &GateRequest) -> bool {
        req.query_param(&self.config().edit_param).is_some()
    }

    pub fn classify(&self, req: &GateRequest) -> RequestKind {
        if self.is_admin_request(req) {
            RequestKind::Admin
        } else if self.is_content_reviewer(req) {
            RequestKind::Reviewer
        } else if self.is_staff_user(req) {
            RequestKind::Staff
        } else {
            RequestKind::Unprivileged
        }
    }

    /// Whether the request may see drafts
    pub fn is_draft(&self, req: &GateRequest) -> bool {
        match self.classify(req) {
            RequestKind::Admin | RequestKind::Reviewer => true,
            RequestKind::Staff => self.is_draft_request(req),
            RequestKind::Unprivileged => {
                self.is_draft_request(req) && self.signer.verify(&req.full_path())
            }
        }
    }

    /// Start a request: reset `ctx`, decide draft mode, maybe redirect
    ///
    /// # Errors
    ///
    /// Returns `SecretStore` or `InvalidUrl` if a redirect URL cannot be signed.
    pub fn process_request(&self, req: &GateRequest, ctx: &mut DraftContext) -> Result<GateOutcome> {
        ctx.begin_request_with(req.correlation(), req.user.clone());
        let kind = self.classify(req);

        if kind == RequestKind::Staff && self.is_draft_request(req) {
            let full_path = req.full_path();
            if !self.signer.verify(&full_path) {
                let location = self.signer.sign(&full_path)?;
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    path = %req.path,
                    request_kind = %kind,
                    "redirecting staff to signed draft url"
                );
                return Ok(GateOutcome::Redirect { location });
            }
        }

        let is_draft = self.is_draft(req);
        ctx.set_draft_request(is_draft);
        tracing::debug!(
            request_id = %ctx.request_id(),
            trace_id = ?ctx.trace_id(),
            path = %req.path,
            request_kind = %kind,
            is_draft = is_draft,
            "gate decision"
        );
        Ok(GateOutcome::Proceed { is_draft })
    }

    /// Finish a request: maybe turn a staff 404 into a draft redirect
    ///
    /// `ctx` is cleared whether or not this succeeds.
    ///
    /// # Errors
    ///
    /// Returns `SecretStore` or `InvalidUrl` if a redirect URL cannot be signed.
    pub fn process_response(
        &self,
        req: &GateRequest,
        ctx: &mut DraftContext,
        response: GateResponse,
    ) -> Result<GateResponse> {
        let scope = RequestScope { ctx };
        let redirect_to_draft = response.status == 404
            && self.classify(req) == RequestKind::Staff
            && !self.is_draft(req);

        if !redirect_to_draft {
            return Ok(response);
        }

        let location = self.signer.sign(&req.full_path())?;
        tracing::debug!(
            request_id = %scope.ctx.request_id(),
            path = %req.path,
            "redirecting staff 404 to draft view"
        );
        Ok(GateResponse::redirect(location))
    }

    /// Run `handler` between the request and response hooks
    ///
    /// The context is cleared at the end, including when the handler fails.
    ///
    /// # Errors
    ///
    /// Propagates errors from the hooks and from `handler`.
    pub fn handle<F>(&self, req: &GateRequest, ctx: &mut DraftContext, handler: F) -> Result<GateResponse>
    where
        F: FnOnce(&DraftContext) -> Result<GateResponse>,
    {
        let scope = RequestScope { ctx };
        let response = match self.process_request(req, &mut *scope.ctx)? {
            GateOutcome::Redirect { location } => GateResponse::redirect(location),
            GateOutcome::Proceed { .. } => handler(&*scope.ctx)?,
        };
        self.process_response(req, &mut *scope.ctx, response)
    }
}

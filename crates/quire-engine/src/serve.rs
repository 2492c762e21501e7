//! Page serving through the publishing gate
//!
//! Detail and list views resolve against `visible()` so a public request
//! sees published copies and a draft request sees drafts. A staff 404 on the
//! public site turns into a redirect to the signed draft URL.

#![allow(clippy::result_large_err)]

use chrono::Utc;
use quire_core::{
    DraftContext, EntityQuery, GateRequest, GateResponse, PublishingConfig, PublishingGate,
    SlugResolver, Store, UrlResolver,
};
use quire_store::errors::Result;
use quire_store::{load_store, SqliteSecretStore};
use rusqlite::Connection;
use serde::Serialize;

use crate::commands::engine_query::EntityView;

#[derive(Debug, Serialize)]
struct ListEntry {
    id: u64,
    title: String,
    url: String,
}

/// Serves detail and list views from a database
pub struct PageServer<'c> {
    conn: &'c Connection,
    config: PublishingConfig,
    resolver: SlugResolver,
}

impl<'c> PageServer<'c> {
    pub fn new(conn: &'c Connection, config: PublishingConfig) -> Self {
        Self {
            conn,
            config,
            resolver: SlugResolver::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: SlugResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Entities the current request may see
    ///
    /// Public requests additionally honour the publication window.
    fn candidates<'s>(&self, store: &'s Store, ctx: &DraftContext) -> EntityQuery<'s> {
        let visible = store.query(ctx).visible();
        if ctx.is_draft_request() {
            visible
        } else {
            visible.within_publication_dates(Utc::now())
        }
    }

    /// Render the entity living at `req.path`
    ///
    /// 200 with a JSON body, 404 when nothing visible lives there, 302 when
    /// the gate redirects staff to the draft view.
    pub fn serve_detail(&self, req: &GateRequest, ctx: &mut DraftContext) -> Result<GateResponse> {
        let store = load_store(self.conn)?;
        let secrets = SqliteSecretStore::new(self.conn);
        let gate = PublishingGate::new(&secrets, self.config.clone());

        let response = gate.handle(req, ctx, |ctx| {
            match self.resolver.resolve(self.candidates(&store, ctx), &req.path) {
                Some(entity) => {
                    let body = serde_json::to_string(&EntityView::build(entity, &store))?;
                    Ok(GateResponse::ok(body))
                }
                None => Ok(GateResponse::not_found()),
            }
        })?;

        tracing::info!(path = %req.path, status = response.status, "served detail");
        Ok(response)
    }

    /// Render every entity the request may see, in id order
    pub fn serve_list(&self, req: &GateRequest, ctx: &mut DraftContext) -> Result<GateResponse> {
        let store = load_store(self.conn)?;
        let secrets = SqliteSecretStore::new(self.conn);
        let gate = PublishingGate::new(&secrets, self.config.clone());

        let response = gate.handle(req, ctx, |ctx| {
            let entries: Vec<ListEntry> = self
                .candidates(&store, ctx)
                .into_iter()
                .filter_map(|row| row.entity())
                .map(|e| ListEntry {
                    id: e.id,
                    title: e.title().to_string(),
                    url: self.resolver.absolute_url(e),
                })
                .collect();
            Ok(GateResponse::ok(serde_json::to_string(&entries)?))
        })?;

        tracing::info!(path = %req.path, status = response.status, "served list");
        Ok(response)
    }
}

//! Serve one request through the gate and print the response

use clap::{Args, ValueEnum};
use quire_core::quire_core_types::TraceId;
use quire_core::{DraftContext, GateRequest, User};
use quire_engine::PageServer;

use super::{CliResult, GlobalArgs};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AsUser {
    Anonymous,
    User,
    Staff,
    Reviewer,
}

#[derive(Debug, Args)]
pub struct ServePathArgs {
    /// Path with optional query, e.g. "/about/?edit=..."
    pub uri: String,

    /// Who is asking
    #[arg(long = "as", value_enum, default_value_t = AsUser::Anonymous)]
    pub as_user: AsUser,

    /// Serve the list view instead of a detail page
    #[arg(long)]
    pub list: bool,

    /// Upstream trace id to carry in the request logs
    #[arg(long, env = "QUIRE_TRACE_ID")]
    pub trace_id: Option<String>,
}

pub fn execute(global: &GlobalArgs, args: ServePathArgs) -> CliResult<()> {
    let conn = global.open_db()?;
    let config = global.load_config()?;

    let user = match args.as_user {
        AsUser::Anonymous => None,
        AsUser::User => Some(User::new(1, "user")),
        AsUser::Staff => Some(User::staff(1, "staff")),
        AsUser::Reviewer => Some(User::new(1, "reviewer").with_group(config.reviewer_group.clone())),
    };
    let mut request = GateRequest::from_uri(&args.uri, user)?;
    if let Some(trace_id) = args.trace_id {
        request = request.with_trace_id(TraceId::from_string(trace_id));
    }

    let server = PageServer::new(&conn, config);
    let mut ctx = DraftContext::new();
    let response = if args.list {
        server.serve_list(&request, &mut ctx)?
    } else {
        server.serve_detail(&request, &mut ctx)?
    };

    println!("{}", response.status);
    if let Some(location) = response.location {
        println!("Location: {}", location);
    }
    if let Some(body) = response.body {
        println!("{}", body);
    }
    Ok(())
}

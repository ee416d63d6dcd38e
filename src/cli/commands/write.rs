use crate::cli::Response;
use crate::session::Session;
use anyhow::Result;

pub fn exec(session: &mut Session, sql: &str) -> Result<Response> {
    Ok(Response::Exec(session.exec(sql)?))
}

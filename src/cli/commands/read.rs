use crate::cli::Response;
use crate::session::Session;
use anyhow::Result;

pub fn sheets(session: &mut Session) -> Result<Response> {
    Ok(Response::Sheets(session.sheets()?))
}

pub fn schema(session: &mut Session, sheet: Option<&str>) -> Result<Response> {
    Ok(Response::Schema(session.schema(sheet)?))
}

pub fn query(session: &mut Session, sql: &str) -> Result<Response> {
    Ok(Response::Query(session.query(sql)?))
}

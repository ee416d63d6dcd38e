use crate::cli::Response;
use crate::session::Session;
use anyhow::Result;

pub fn attach(
    session: &mut Session,
    workbook: Option<String>,
    header_row: Option<u32>,
) -> Result<Response> {
    let outcome = session.attach_workbook(workbook, header_row)?;
    Ok(Response::Attach(outcome))
}

pub fn reload(session: &mut Session, header_row: Option<u32>) -> Result<Response> {
    let outcome = session.reload(header_row)?;
    Ok(Response::Attach(outcome))
}

use miette::{GraphicalReportHandler, Report};

/// Renders a report with its causes and help for the log.
pub fn render_report(report: &Report) -> String {
    let mut rendered = String::new();
    match GraphicalReportHandler::new().render_report(&mut rendered, &**report) {
        Ok(()) => rendered,
        Err(_) => format!("{report:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::store::RecipientId;

    #[test]
    fn rendering_includes_help() {
        let report = Report::new(StorageError::UnknownRecipient(RecipientId(5)));
        let rendered = render_report(&report);
        assert!(rendered.contains("recipient 5 is not registered"));
        assert!(rendered.contains("/start"));
    }
}

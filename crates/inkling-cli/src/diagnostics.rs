use ariadne::{Config, Label, Report, ReportKind, Source};
use inkling::literal::ParseError;

/// Render literal parse errors against their source text.
pub fn report(origin: &str, source: &str, errors: &[ParseError<'_>]) -> String {
    let mut rendered = String::new();
    for error in errors {
        let span = error.span().into_range();
        let mut bytes = Vec::new();
        let written = Report::build(ReportKind::Error, (origin, span.clone()))
            .with_config(Config::default().with_color(false))
            .with_message(error.to_string())
            .with_label(Label::new((origin, span)).with_message(error.reason().to_string()))
            .finish()
            .write((origin, Source::from(source)), &mut bytes);
        match written {
            Ok(()) => rendered.push_str(&String::from_utf8_lossy(&bytes)),
            Err(io) => {
                log::warn!("could not render a diagnostic: {io}");
                rendered.push_str(&format!("{origin}: {error}\n"));
            }
        }
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_name_the_origin_and_the_problem() {
        let source = "(1 2";
        let errors = inkling::literal::parse(source).unwrap_err();
        let text = report("body[0]", source, &errors);
        assert!(text.contains("body[0]"), "{text}");
        assert!(text.contains("Error"), "{text}");
    }
}

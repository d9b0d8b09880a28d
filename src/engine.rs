//! Template assembler: drives the full token pipeline and splices rendered
//! markup back into the template text.

use crate::chart::Representation;
use crate::parser::{scan, InstructionSet};
use crate::render;
use crate::source::DataSource;
use crate::{table, transform};
use anyhow::{anyhow, Context, Result};
use log::debug;
use std::collections::HashSet;

/// Render a template: every `{{...}}` token is parsed, its query executed
/// against `source`, and the token's text replaced by the markup for the
/// requested representation. Text outside tokens is preserved verbatim.
///
/// Replacement is string-equality based: every literal occurrence of a
/// token's text is substituted with the markup of its first processing, so
/// textually identical tokens share one result (and one query execution).
///
/// Tokens are processed strictly in discovery order, one query at a time.
/// The first failing token aborts the render with the template name and
/// token body attached, leaving the caller to decide between a partial
/// result and a hard failure.
pub fn render_template(name: &str, template: &str, source: &dyn DataSource) -> Result<String> {
    let mut output = template.to_string();
    let mut seen: HashSet<&str> = HashSet::new();

    for (ordinal, token) in scan(template).enumerate() {
        if !seen.insert(token.raw) {
            debug!("duplicate token at offset {} already substituted", token.start);
            continue;
        }

        let markup = process_token(token.body, ordinal + 1, source)
            .with_context(|| format!("token '{}' in template '{}'", token.body, name))?;
        output = output.replace(token.raw, &markup);
    }

    Ok(output)
}

/// Run one token through parse -> query -> transform -> render.
fn process_token(body: &str, ordinal: usize, source: &dyn DataSource) -> Result<String> {
    let instructions = InstructionSet::parse(body);
    let query = instructions
        .query()
        .ok_or_else(|| anyhow!("token has no query instruction"))?;

    let data = source
        .execute(query)
        .with_context(|| format!("query '{}' failed", query))?;

    let kind = instructions.representation();
    let id = format!("{}_{}", kind.id_prefix(), ordinal);

    let markup = match kind {
        Representation::Table => {
            let spec = table::build(&data, &instructions.formatting());
            render::table(&spec, &id)
        }
        Representation::Bar | Representation::Line => {
            let spec = transform::build_xy(kind, &data, &instructions);
            render::chart(kind, &spec, &instructions.formatting(), &id)
        }
        Representation::Pie => {
            let specs = transform::build_pie(&data, &instructions);
            render::pies(&specs, &instructions.formatting(), &id)
        }
    };

    Ok(markup)
}

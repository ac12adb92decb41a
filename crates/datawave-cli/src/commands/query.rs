use std::io;

use datawave_core::output::{persist, print_to_console};
use datawave_core::{normalize, QueryParameters, QueryResults, QuerySession};
use tracing::info;

use crate::cli::QueryArgs;
use crate::error::CliError;

use super::Context;

pub fn run(args: &QueryArgs, context: &Context) -> Result<(), CliError> {
    let params = QueryParameters::new(&args.query_name, &args.query, &args.auths)
        .with_column_visibility(&args.visibility)
        .with_page_size(args.page_size)
        .with_date_range(&args.begin, &args.end);
    params.validate()?;

    let session = QuerySession::new(context.config.clone(), context.client.clone(), params)
        .with_credential_label(context.credential.label());
    let results = session.collect()?;

    let events = normalize::filter(results.events, args.filter.as_deref())?;
    let results = QueryResults::new(results.metadata, events);

    match &args.output {
        Some(path) => {
            let report = persist(&results, path, args.decode_raw)?;
            if let Some(renamed) = &report.renamed {
                info!("Previous output kept at {}", renamed.display());
            }
        }
        None => {
            let stdout = io::stdout();
            print_to_console(&results, args.decode_raw, &mut stdout.lock())?;
        }
    }
    Ok(())
}

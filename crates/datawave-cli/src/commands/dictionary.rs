use std::io;

use datawave_core::dictionary::{fetch_dictionary, save_dictionary, write_dictionary};

use crate::cli::DictionaryArgs;
use crate::error::CliError;

use super::Context;

pub fn run(args: &DictionaryArgs, context: &Context) -> Result<(), CliError> {
    let fields = fetch_dictionary(
        context.client.as_ref(),
        &context.config,
        &args.auths,
        args.data_types.as_deref(),
    )?;

    match &args.output {
        Some(path) => save_dictionary(&fields, path)?,
        None => write_dictionary(&fields, &mut io::stdout().lock())?,
    }
    Ok(())
}

use datawave_core::admin::{reload_accumulo_cache, view_accumulo_cache};

use crate::cli::AccumuloArgs;
use crate::error::CliError;

use super::Context;

pub fn run(args: &AccumuloArgs, context: &Context) -> Result<(), CliError> {
    if args.view {
        println!("{}", view_accumulo_cache(context.client.as_ref(), &context.config)?);
    } else {
        reload_accumulo_cache(context.client.as_ref(), &context.config)?;
    }
    Ok(())
}

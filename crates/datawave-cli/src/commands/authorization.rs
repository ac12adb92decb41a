use datawave_core::admin::{evict_all_users, whoami};

use crate::cli::AuthorizationArgs;
use crate::error::CliError;

use super::Context;

pub fn run(args: &AuthorizationArgs, context: &Context) -> Result<(), CliError> {
    let text = if args.evict {
        evict_all_users(context.client.as_ref(), &context.config)?
    } else {
        whoami(context.client.as_ref(), &context.config)?
    };
    println!("{text}");
    Ok(())
}

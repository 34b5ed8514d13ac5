//! `colcon-rebar3 identify` command

use anyhow::Result;

use crate::cli::IdentifyArgs;
use colcon_rebar3::core::PackageMetadata;
use colcon_rebar3::ops::identify::{PackageIdentification, Rebar3Identification};
use colcon_rebar3::util::{GlobalContext, Shell, Status};

pub fn execute(args: IdentifyArgs, verbose: bool) -> Result<()> {
    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(verbose);

    let path = args
        .path
        .as_deref()
        .map(|p| ctx.resolve(p))
        .unwrap_or_else(|| ctx.cwd().to_path_buf());

    let mut metadata = PackageMetadata::new(&path);
    metadata.package_type = args.package_type;

    let identified = Rebar3Identification.identify(&mut metadata)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }

    let shell = Shell::from_flags(ctx.is_verbose(), false);
    if !identified {
        shell.status(
            Status::Warning,
            format!("`{}` is not a rebar3 package", path.display()),
        );
        return Ok(());
    }

    shell.status(
        Status::Found,
        format!(
            "{} ({})",
            metadata.name.as_deref().unwrap_or_default(),
            path.display()
        ),
    );
    let deps = metadata.dependencies.all();
    if deps.is_empty() {
        println!("dependencies: (none)");
    } else {
        println!(
            "dependencies: {}",
            deps.into_iter().collect::<Vec<_>>().join(", ")
        );
    }
    Ok(())
}

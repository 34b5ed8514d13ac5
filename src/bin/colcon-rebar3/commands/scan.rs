//! `colcon-rebar3 scan` command

use anyhow::Result;
use serde::Serialize;

use crate::cli::ScanArgs;
use colcon_rebar3::ops::scan::scan_workspace;
use colcon_rebar3::util::GlobalContext;

#[derive(Serialize)]
struct ScannedPackage<'a> {
    name: &'a str,
    path: String,
    dependencies: Vec<&'a str>,
}

pub fn execute(args: ScanArgs, verbose: bool) -> Result<()> {
    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(verbose);

    let root = args
        .root
        .as_deref()
        .map(|p| ctx.resolve(p))
        .unwrap_or_else(|| ctx.cwd().to_path_buf());

    let graph = scan_workspace(&root)?;
    let order = graph.build_order()?;

    let packages: Vec<ScannedPackage> = order
        .iter()
        .map(|p| {
            let name = p.name.as_deref().unwrap_or_default();
            ScannedPackage {
                name,
                path: p.path.display().to_string(),
                dependencies: graph.workspace_dependencies(name),
            }
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&packages)?);
        return Ok(());
    }

    if packages.is_empty() {
        eprintln!("no rebar3 packages found under {}", root.display());
        return Ok(());
    }

    for package in &packages {
        println!("{}\t{}", package.name, package.path);
    }
    Ok(())
}

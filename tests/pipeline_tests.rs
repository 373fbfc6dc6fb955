// End-to-end pipeline tests over throwaway source, build and data trees.

use clap::Parser;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use motifpipe_setup::cli::{Cli, Commands};
use motifpipe_setup::install_config::candidate_path;
use motifpipe_setup::pipeline::{self, BuildContext, PipelineStage};
use motifpipe_setup::{ConfigInstallOutcome, Configuration, Layout, SearchPath, SubordinateOutcome};

struct Trees {
    _root: tempfile::TempDir,
    source: PathBuf,
    build: PathBuf,
    data: PathBuf,
}

fn write_file(path: &Path, mode: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, format!("{}\n", path.display())).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

/// Source tree with a handful of bundled engines.
fn trees() -> Trees {
    let root = tempfile::tempdir().expect("tempdir");
    let source = root.path().join("motifpipe-src");
    write_file(&source.join("src/homer/bin/homer2"), 0o755);
    write_file(&source.join("src/GADEM_v1.3/src/gadem"), 0o755);
    write_file(&source.join("src/trawler_standalone-1.2/bin/trawler.pl"), 0o644);
    write_file(&source.join("src/MotifSampler/MotifSampler_x86_64"), 0o755);
    write_file(&source.join("src/MotifSampler/MotifSampler_i386"), 0o755);
    write_file(&source.join("src/weblogo/seqlogo"), 0o755);
    Trees {
        build: root.path().join("build"),
        data: root.path().join("share"),
        source,
        _root: root,
    }
}

fn context(trees: &Trees, command: &str) -> (BuildContext, Commands) {
    let cli = Cli::try_parse_from([
        "motifpipe-setup",
        command,
        "--source-dir",
        trees.source.to_str().unwrap(),
        "--build-base",
        trees.build.to_str().unwrap(),
        "--install-data",
        trees.data.to_str().unwrap(),
        "--machine",
        "x86_64",
    ])
    .expect("Should parse");
    let layout = Layout::from_cli(&cli).expect("Should resolve");
    (
        BuildContext::with_search_path(layout, SearchPath::default()),
        cli.command,
    )
}

fn run(trees: &Trees, command: &str) -> BuildContext {
    let (ctx, command) = context(trees, command);
    pipeline::run(ctx, command).expect("Pipeline should succeed")
}

#[test]
fn test_build_writes_configuration_for_staged_engines() {
    let trees = trees();
    let ctx = run(&trees, "build");

    let config = Configuration::load_from_file(&ctx.layout.built_config).expect("Should load");
    let staging = &ctx.layout.staging_root;

    assert_eq!(
        config.params.available_tools,
        vec!["GADEM", "MotifSampler", "trawler", "JASPAR", "Homer"]
    );
    assert_eq!(
        config.params.tools,
        vec!["MotifSampler", "trawler", "JASPAR", "Homer"]
    );
    assert_eq!(config.program("Homer").unwrap().bin, staging.join("homer2"));
    assert_eq!(
        config.program("trawler").unwrap().dir,
        Some(staging.join("trawler"))
    );
    assert_eq!(config.main.seqlogo, Some(staging.join("seqlogo")));
    assert!(!config.is_configured("MEME"));

    let staged = fs::read_to_string(staging.join("MotifSampler")).unwrap();
    assert!(staged.contains("MotifSampler_x86_64"));
}

#[test]
fn test_full_install_rewrites_to_install_tree() {
    let trees = trees();
    let ctx = run(&trees, "install");

    assert_eq!(ctx.report.completed, PipelineStage::all_stages());
    assert!(matches!(
        ctx.report.cluster_library,
        Some(SubordinateOutcome::Skipped(_))
    ));

    let layout = &ctx.layout;
    let tools = &layout.install_tools_root;
    assert_eq!(tools, &trees.data.join("motifpipe/tools"));

    let installed_script = tools.join("trawler/bin/trawler.pl");
    let mode = fs::metadata(&installed_script).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);

    assert_eq!(
        ctx.report.config,
        Some(ConfigInstallOutcome::Written {
            path: layout.final_config.clone()
        })
    );
    let config = Configuration::load_from_file(&layout.final_config).expect("Should load");
    for (name, entry) in &config.programs {
        if name == "JASPAR" {
            assert_eq!(entry.bin, PathBuf::from("/bin/false"));
            assert_eq!(entry.dir, None);
            continue;
        }
        assert!(entry.bin.starts_with(tools), "{} not rewritten", name);
        assert!(!entry.bin.starts_with(&layout.staging_root));
    }
    assert_eq!(config.program("trawler").unwrap().dir, Some(tools.join("trawler")));
    assert_eq!(config.main.seqlogo, Some(tools.join("seqlogo")));
    assert_eq!(
        config.main.template_dir,
        Some(trees.data.join("motifpipe/templates"))
    );
}

#[test]
fn test_reinstall_preserves_existing_configuration() {
    let trees = trees();
    let first = run(&trees, "install");
    let final_config = first.layout.final_config.clone();

    let customized = fs::read_to_string(&final_config).unwrap() + "# local tweak\n";
    fs::write(&final_config, &customized).unwrap();

    let second = run(&trees, "install");

    assert_eq!(fs::read_to_string(&final_config).unwrap(), customized);
    let candidate = candidate_path(&final_config);
    assert_eq!(
        second.report.config,
        Some(ConfigInstallOutcome::Candidate {
            existing: final_config.clone(),
            candidate: candidate.clone(),
        })
    );
    let new_config = Configuration::load_from_file(&candidate).expect("Should load");
    assert!(new_config.is_configured("Homer"));
}

#[test]
fn test_stages_run_independently() {
    let trees = trees();
    run(&trees, "build-tools");
    let ctx = run(&trees, "build-config");
    assert_eq!(ctx.report.completed, vec![PipelineStage::BuildConfig]);
    assert!(ctx.report.staging.is_none());

    run(&trees, "install-tools");
    let ctx = run(&trees, "install-config");
    assert!(ctx.layout.final_config.is_file());
}

#[test]
fn test_install_config_before_build_fails() {
    let trees = trees();
    let (ctx, command) = context(&trees, "install-config");
    let final_config = ctx.layout.final_config.clone();

    assert!(pipeline::run(ctx, command).is_err());
    assert!(!final_config.exists());
}

#[test]
fn test_system_engine_kept_outside_install_tree() {
    let trees = trees();
    let system = tempfile::tempdir().expect("tempdir");
    write_file(&system.path().join("weederTFBS.out"), 0o755);

    let (ctx, _) = context(&trees, "install");
    let ctx = BuildContext::with_search_path(
        ctx.layout,
        SearchPath::new([system.path().to_path_buf()]),
    );
    let ctx = pipeline::run(ctx, Commands::Install).expect("Pipeline should succeed");

    let config = Configuration::load_from_file(&ctx.layout.final_config).unwrap();
    let weeder = config.program("Weeder").expect("Weeder entry");
    assert_eq!(weeder.bin, system.path().join("weederTFBS.out"));
    assert_eq!(weeder.dir, Some(system.path().to_path_buf()));
}

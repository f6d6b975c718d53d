use super::*;
use crate::error::PipelineError;
use crate::fixtures::make_temp_dir;

fn plot_args(extra: &[&str]) -> PlotArgs {
    let mut argv = vec!["kira-blobplot", "plot", "-i", "assembly.blobDB.json"];
    argv.extend_from_slice(extra);
    match Cli::try_parse_from(argv).unwrap().command {
        Command::Plot(args) => args,
    }
}

#[test]
fn test_parse_defaults() {
    let args = plot_args(&[]);
    assert_eq!(args.plotgroups, 8);
    assert_eq!(args.length, 100);
    assert_eq!(args.rank, "phylum");
    assert_eq!(args.taxrule, "bestsum");
    assert_eq!(args.sort, SortOrder::Span);
    assert_eq!(args.hist, HistType::Span);
    assert_eq!(args.format, PlotFormat::Png);

    let config = build_config(&args).unwrap();
    assert!(config.validate().is_ok());
    assert!(config.sort_first.is_empty());
    assert!(config.user_labels.is_empty());
}

#[test]
fn test_parse_full_option_set() {
    let args = plot_args(&[
        "-p", "6", "-l", "500", "-r", "genus", "-x", "bestsumorder", "--sort", "count",
        "--sort_first", "no-hit,other", "--hist", "count", "--label", "Bact=Firmicutes,Actinobacteria",
        "--exclude", "undef", "--lib", "bam0", "-n", "-s", "--cumulative", "--format", "svg",
        "-o", "out/",
    ]);
    let config = build_config(&args).unwrap();
    assert_eq!(config.max_group_plot, 6);
    assert_eq!(config.min_length, 500);
    assert_eq!(config.rank, crate::model::sequence::Rank::Genus);
    assert_eq!(config.taxrule, crate::model::sequence::TaxRule::BestSumOrder);
    assert_eq!(config.sort_order, SortOrder::Count);
    assert_eq!(config.sort_first.len(), 2);
    assert_eq!(config.user_labels.len(), 2);
    assert_eq!(config.exclude.len(), 1);
    assert_eq!(config.lib_selection, Some(vec!["bam0".to_string()]));
    assert!(config.hide_nohits && config.no_scale && config.cumulative);
    assert_eq!(config.render.format, PlotFormat::Svg);
    assert_eq!(config.out_prefix, Some(PathBuf::from("out/")));
}

#[test]
fn test_unsupported_rank_is_configuration_error() {
    let args = plot_args(&["-r", "kingdom"]);
    assert!(matches!(
        build_config(&args),
        Err(PipelineError::Configuration(_))
    ));
    let args = plot_args(&["-x", "best"]);
    assert!(matches!(
        build_config(&args),
        Err(PipelineError::Configuration(_))
    ));
}

#[test]
fn test_missing_colour_file_is_input_error() {
    let args = plot_args(&["--colours", "/nonexistent/colours.txt"]);
    assert!(matches!(build_config(&args), Err(PipelineError::InputFile(_))));
}

#[test]
fn test_invalid_sort_value_rejected_by_parser() {
    let argv = vec!["kira-blobplot", "plot", "-i", "db.json", "--sort", "gc"];
    assert!(Cli::try_parse_from(argv).is_err());
}

const END_TO_END_DB: &str = r#"{
  "title": "asm",
  "order_of_blobs": ["c1", "c2", "c3"],
  "dict_of_blobs": {
    "c1": {"length": 5000, "gc": 0.4, "covs": {"bam0": 20.0}, "read_cov": {"bam0": 80},
           "taxonomy": {"bestsum": {"phylum": {"tax": "Chordata", "score": 1.0, "c_index": 0}}}},
    "c2": {"length": 900, "gc": 0.6, "covs": {"bam0": 200.0}, "read_cov": {"bam0": 15},
           "taxonomy": {"bestsum": {"phylum": {"tax": "Proteobacteria", "score": 1.0, "c_index": 0}}}},
    "c3": {"length": 300, "gc": 0.3, "covs": {"bam0": 1.0},
           "taxonomy": {"bestsum": {"phylum": {"tax": "no-hit", "score": 0.0, "c_index": 0}}}}
  },
  "covLibs": {"bam0": {"name": "bam0", "f": "reads.bam", "reads_total": 100, "reads_mapped": 95}},
  "taxrules": ["bestsum"]
}"#;

#[test]
fn test_run_plot_end_to_end() {
    let dir = make_temp_dir();
    let db_path = dir.join("asm.blobDB.json");
    std::fs::write(&db_path, END_TO_END_DB).unwrap();
    let prefix = format!("{}/", dir.join("results").display());

    let args = plot_args(&["-o", &prefix, "--sort_first", "no-hit"]);
    let args = PlotArgs {
        infile: db_path,
        ..args
    };
    run_plot(&args).unwrap();

    let base = dir
        .join("results")
        .join("asm.bestsum.phylum.p8.span.100.first_no-hit.blobplot");
    let stats = std::fs::read_to_string(format!("{}.stats.txt", base.display())).unwrap();
    let rows: Vec<&str> = stats.lines().filter(|l| !l.starts_with('#')).collect();
    assert!(rows[0].starts_with("no-hit\tno-hit\t#d3d3d3\t1\t"));
    assert!(rows[1].starts_with("Chordata\t"));
    assert!(std::path::Path::new(&format!("{}.plotdata.json", base.display())).exists());
}

#[test]
fn test_run_plot_writes_nothing_on_data_error() {
    let dir = make_temp_dir();
    let db_path = dir.join("asm.blobDB.json");
    std::fs::write(&db_path, END_TO_END_DB).unwrap();
    let prefix = format!("{}/", dir.join("results").display());

    let args = plot_args(&["-o", &prefix, "-r", "genus"]);
    let args = PlotArgs {
        infile: db_path,
        ..args
    };
    assert!(matches!(run_plot(&args), Err(PipelineError::Data(_))));
    assert!(!dir.join("results").exists());
}

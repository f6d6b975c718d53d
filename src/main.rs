mod error;
mod input;
mod logging;
mod model;
mod pipeline;
mod report;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::error::PipelineResult;
use crate::input::auxfiles::{
    parse_categories, parse_cmd_list, parse_colours, parse_group_list, parse_refcov,
    parse_user_labels,
};
use crate::input::load_blobdb;
use crate::model::config::{HistType, PlotConfig, PlotFormat, RenderOptions, SortOrder};
use crate::pipeline::stage1_resolve::{Stage1Params, run_stage1};
use crate::pipeline::stage2_order::{Stage2Params, run_stage2};
use crate::pipeline::stage3_labels::{Stage3Params, run_stage3};
use crate::pipeline::stage4_stats::{Stage4Inputs, run_stage4};
use crate::pipeline::stage5_dataset::{Stage5Inputs, run_stage5};
use crate::pipeline::stage6_output::{output_base, output_key, write_outputs};
use crate::report::ReportMeta;

#[derive(Debug, Parser)]
#[command(
    name = "kira-blobplot",
    version,
    about = "GC-coverage blob plots and taxonomic group statistics for genome assemblies"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Group, order, label and summarise a BlobDB for plotting.
    Plot(PlotArgs),
}

#[derive(Debug, Args)]
struct PlotArgs {
    /// BlobDB JSON file (optionally .gz).
    #[arg(short = 'i', long = "infile")]
    infile: PathBuf,
    /// Plot only these coverage libraries, separated by ",".
    #[arg(long = "lib")]
    lib: Option<String>,
    /// Do not add the BlobDB title to plots.
    #[arg(long)]
    notitle: bool,
    /// Label the coverage axis with the library file name.
    #[arg(long)]
    filelabel: bool,
    /// Number of groups to plot; remaining groups are placed in 'other'.
    #[arg(short = 'p', long = "plotgroups", default_value_t = 8)]
    plotgroups: usize,
    /// Minimum sequence length considered for plotting.
    #[arg(short = 'l', long = "length", default_value_t = 100)]
    length: u64,
    /// Colour blobs by c-index.
    #[arg(long)]
    cindex: bool,
    /// Hide sequences without taxonomic annotation.
    #[arg(short = 'n', long = "nohit")]
    nohit: bool,
    /// Do not scale sequences by length.
    #[arg(short = 's', long = "noscale")]
    noscale: bool,
    /// Plot the legend in a separate figure.
    #[arg(long)]
    legend: bool,
    /// One blobplot per group.
    #[arg(short = 'm', long)]
    multiplot: bool,
    /// One blobplot after the addition of each group.
    #[arg(long)]
    cumulative: bool,
    /// Sort order for plotting.
    #[arg(long, value_enum, default_value_t = SortOrder::Span)]
    sort: SortOrder,
    /// Groups always plotted first, regardless of sort order (e.g. "no-hit,other,undef").
    #[arg(long = "sort_first")]
    sort_first: Option<String>,
    /// Weighting of histograms.
    #[arg(long, value_enum, default_value_t = HistType::Span)]
    hist: HistType,
    /// Taxonomic rank used for grouping (species, genus, family, order, phylum, superkingdom).
    #[arg(short = 'r', long, default_value = "phylum")]
    rank: String,
    /// Taxrule used when computing taxonomy (bestsum, bestsumorder).
    #[arg(short = 'x', long, default_value = "bestsum")]
    taxrule: String,
    /// Figure format requested from the renderer.
    #[arg(long, value_enum, default_value_t = PlotFormat::Png)]
    format: PlotFormat,
    /// Omit the blobplot.
    #[arg(long)]
    noblobs: bool,
    /// Omit the read-mapping plot.
    #[arg(long)]
    noreads: bool,
    /// Output prefix; a trailing "/" names a directory.
    #[arg(short = 'o', long = "out")]
    out: Option<PathBuf>,
    /// Relabel groups, e.g. "A=Actinobacteria,Proteobacteria". Repeatable.
    #[arg(long = "label")]
    label: Vec<String>,
    /// File of "group,#rrggbb" colours.
    #[arg(long)]
    colours: Option<PathBuf>,
    /// Groups to exclude, e.g. "Actinobacteria,other".
    #[arg(long)]
    exclude: Option<String>,
    /// File of "library,total_reads,mapped_reads".
    #[arg(long)]
    refcov: Option<PathBuf>,
    /// File of "sequence<TAB>category" used instead of taxonomy.
    #[arg(long)]
    catcolour: Option<PathBuf>,
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> PipelineResult<()> {
    match cli.command {
        Command::Plot(args) => run_plot(&args),
    }
}

fn run_plot(args: &PlotArgs) -> PipelineResult<()> {
    let config = build_config(args)?;
    config.validate()?;

    tracing::info!("loading BlobDB {}", args.infile.display());
    let db = load_blobdb(&args.infile)?;

    let stage1 = run_stage1(
        &db,
        &Stage1Params {
            rank: config.rank,
            taxrule: config.taxrule,
            min_length: config.min_length,
            hide_nohits: config.hide_nohits,
            c_index: config.c_index,
            categories: config.categories.as_ref(),
            lib_selection: config.lib_selection.as_deref(),
            refcov: config.refcov.as_ref(),
        },
    )?;

    let order = run_stage2(
        stage1.groups,
        &Stage2Params {
            sort_order: config.sort_order,
            sort_first: &config.sort_first,
            max_group_plot: config.max_group_plot,
        },
    )?;

    let labels = run_stage3(
        &order,
        &Stage3Params {
            user_labels: &config.user_labels,
            exclude: &config.exclude,
            colours: config.colours.as_ref(),
        },
    )?;

    let stats = run_stage4(&Stage4Inputs {
        records: &db.records,
        order: &order,
        labels: &labels,
        libraries: &stage1.libraries,
        summary: &stage1.summary,
    });

    let dataset = run_stage5(&Stage5Inputs {
        title: &db.title,
        records: &db.records,
        order: &order,
        labels: &labels,
        libraries: &stage1.libraries,
        coverage_range: stats.coverage_range,
        render: &config.render,
        hist_type: config.hist_type,
        no_scale: config.no_scale,
        cumulative: config.cumulative,
        multiplot: config.multiplot,
    });

    let key = output_key(&db.title, &config);
    let base = output_base(config.out_prefix.as_deref(), &key);
    let meta = ReportMeta {
        tool_name: env!("CARGO_PKG_NAME").to_string(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        title: db.title.clone(),
        output_key: key,
        blobdb_path: args.infile.display().to_string(),
        blobdb_version: db.version.clone(),
        rank: config.rank.to_string(),
        taxrule: config.taxrule.to_string(),
        min_length: config.min_length,
        max_group_plot: config.max_group_plot,
        sort_order: config.sort_order.as_str().to_string(),
        hist_type: config.hist_type.as_str().to_string(),
    };
    write_outputs(&base, &meta, &stats, &dataset)?;

    Ok(())
}

fn build_config(args: &PlotArgs) -> PipelineResult<PlotConfig> {
    let exclude = match &args.exclude {
        Some(raw) => parse_group_list(raw)?,
        None => Vec::new(),
    };
    let sort_first = match &args.sort_first {
        Some(raw) => parse_group_list(raw)?,
        None => Vec::new(),
    };
    let lib_selection = args.lib.as_deref().map(parse_cmd_list);
    let colours = args.colours.as_deref().map(parse_colours).transpose()?;
    let refcov = args.refcov.as_deref().map(parse_refcov).transpose()?;
    let categories = args.catcolour.as_deref().map(parse_categories).transpose()?;

    Ok(PlotConfig {
        rank: args.rank.parse()?,
        taxrule: args.taxrule.parse()?,
        min_length: args.length,
        max_group_plot: args.plotgroups,
        hide_nohits: args.nohit,
        c_index: args.cindex,
        sort_order: args.sort,
        sort_first,
        hist_type: args.hist,
        no_scale: args.noscale,
        cumulative: args.cumulative,
        multiplot: args.multiplot,
        lib_selection,
        exclude,
        user_labels: parse_user_labels(&args.label)?,
        colours,
        categories,
        refcov,
        render: RenderOptions {
            format: args.format,
            no_title: args.notitle,
            file_label: args.filelabel,
            legend: args.legend,
            no_blobs: args.noblobs,
            no_reads: args.noreads,
        },
        out_prefix: args.out.clone(),
    })
}

#[cfg(test)]
#[path = "../tests/src_inline/fixtures.rs"]
mod fixtures;

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;

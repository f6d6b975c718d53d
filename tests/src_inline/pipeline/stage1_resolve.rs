use super::*;
use crate::fixtures::{blobdb, key, library, record, record_with_cindex};

fn params() -> Stage1Params<'static> {
    Stage1Params {
        rank: Rank::Phylum,
        taxrule: TaxRule::BestSum,
        min_length: 100,
        hide_nohits: false,
        c_index: false,
        categories: None,
        lib_selection: None,
        refcov: None,
    }
}

fn sample_db() -> BlobDb {
    blobdb(
        vec![
            record("ctg1", 5000, 0.40, "Chordata", &[("bam0", 20.0)]),
            record("ctg2", 3000, 0.42, "Chordata", &[("bam0", 22.0)]),
            record("ctg3", 2000, 0.60, "Proteobacteria", &[("bam0", 150.0)]),
            record("ctg4", 50, 0.55, "Proteobacteria", &[("bam0", 140.0)]),
            record("ctg5", 700, 0.35, "no-hit", &[("bam0", 3.0)]),
        ],
        vec![library("bam0", 1000, 600)],
    )
}

#[test]
fn test_groups_by_rank_and_filters_length() {
    let out = run_stage1(&sample_db(), &params()).unwrap();
    assert_eq!(out.groups.len(), 3);

    let chordata = &out.groups[&key("Chordata")];
    assert_eq!(chordata.members, vec![0, 1]);
    assert_eq!(chordata.span, 8000);
    assert_eq!(chordata.count, 2);

    let proteo = &out.groups[&key("Proteobacteria")];
    assert_eq!(proteo.members, vec![2]);

    assert_eq!(out.summary.total_count, 5);
    assert_eq!(out.summary.total_span, 10750);
    assert_eq!(out.summary.below_length_count, 1);
    assert_eq!(out.summary.below_length_span, 50);
    assert_eq!(out.summary.visible_count, 4);
    assert_eq!(out.summary.visible_span, 10700);
}

#[test]
fn test_hide_nohits_drops_unclassified() {
    let p = Stage1Params {
        hide_nohits: true,
        ..params()
    };
    let out = run_stage1(&sample_db(), &p).unwrap();
    assert!(!out.groups.contains_key(&key("no-hit")));
    assert_eq!(out.summary.unclassified_hidden_count, 1);
    assert_eq!(out.summary.unclassified_hidden_span, 700);
    assert_eq!(out.summary.visible_count, 3);
}

#[test]
fn test_category_overrides_taxonomy() {
    let mut categories = BTreeMap::new();
    categories.insert("ctg1".to_string(), key("host"));
    categories.insert("ctg3".to_string(), key("host"));
    categories.insert("missing".to_string(), key("ghost"));
    let p = Stage1Params {
        categories: Some(&categories),
        ..params()
    };
    let out = run_stage1(&sample_db(), &p).unwrap();
    assert_eq!(out.groups[&key("host")].members, vec![0, 2]);
    assert_eq!(out.groups[&key("Chordata")].members, vec![1]);
    assert!(!out.groups.contains_key(&key("Proteobacteria")));
    assert!(!out.groups.contains_key(&key("ghost")));
}

#[test]
fn test_category_wins_over_c_index() {
    let db = blobdb(
        vec![
            record_with_cindex("ctg1", 500, 0.4, "Chordata", 2, &[]),
            record_with_cindex("ctg2", 500, 0.4, "Chordata", 0, &[]),
        ],
        vec![],
    );
    let mut categories = BTreeMap::new();
    categories.insert("ctg1".to_string(), key("flagged"));
    let p = Stage1Params {
        c_index: true,
        categories: Some(&categories),
        ..params()
    };
    let record = &db.records[0];
    assert_eq!(resolve_group_key(record, &p).unwrap(), key("flagged"));
    assert_eq!(resolve_group_key(&db.records[1], &p).unwrap(), key("0"));
}

#[test]
fn test_c_index_groups() {
    let db = blobdb(
        vec![
            record_with_cindex("ctg1", 500, 0.4, "Chordata", 2, &[]),
            record_with_cindex("ctg2", 500, 0.4, "Arthropoda", 2, &[]),
            record_with_cindex("ctg3", 500, 0.4, "Chordata", 0, &[]),
        ],
        vec![],
    );
    let p = Stage1Params {
        c_index: true,
        ..params()
    };
    let out = run_stage1(&db, &p).unwrap();
    assert_eq!(out.groups[&key("2")].count, 2);
    assert_eq!(out.groups[&key("0")].count, 1);
}

#[test]
fn test_missing_rank_is_data_error() {
    let mut db = sample_db();
    db.records[1]
        .taxonomy
        .get_mut(&TaxRule::BestSum)
        .unwrap()
        .remove(&Rank::Phylum);
    let err = run_stage1(&db, &params()).unwrap_err();
    assert!(matches!(err, PipelineError::Data(msg) if msg.contains("ctg2")));
}

#[test]
fn test_missing_taxrule_is_data_error() {
    let mut db = sample_db();
    db.records[0].taxonomy.clear();
    assert!(matches!(
        run_stage1(&db, &params()),
        Err(PipelineError::Data(_))
    ));
}

#[test]
fn test_short_records_skip_taxonomy_checks() {
    let mut db = sample_db();
    db.records[3].taxonomy.clear();
    assert!(run_stage1(&db, &params()).is_ok());
}

#[test]
fn test_taxrule_not_in_db_is_configuration_error() {
    let mut db = sample_db();
    db.taxrules = vec!["bestsum".to_string()];
    let p = Stage1Params {
        taxrule: TaxRule::BestSumOrder,
        ..params()
    };
    assert!(matches!(
        run_stage1(&db, &p),
        Err(PipelineError::Configuration(_))
    ));
}

#[test]
fn test_covsum_only_with_several_libraries() {
    let out = run_stage1(&sample_db(), &params()).unwrap();
    assert_eq!(out.libraries.len(), 1);

    let mut db = sample_db();
    db.cov_libs.push(library("bam1", 0, 0));
    let out = run_stage1(&db, &params()).unwrap();
    let ids: Vec<&str> = out.libraries.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["bam0", "bam1", "covsum"]);
    let covsum = &out.libraries[2];
    assert!(covsum.synthetic);
    assert_eq!(covsum.reads_total, 1000);
    assert_eq!(covsum.reads_mapped, 600);
}

#[test]
fn test_library_selection_and_refcov() {
    let mut db = sample_db();
    db.cov_libs.push(library("bam1", 0, 0));
    let selection = vec!["bam1".to_string(), "bam0".to_string()];
    let mut refcov = BTreeMap::new();
    refcov.insert("bam1".to_string(), ReadTotals { total: 500, mapped: 50 });
    let p = Stage1Params {
        lib_selection: Some(&selection),
        refcov: Some(&refcov),
        ..params()
    };
    let out = run_stage1(&db, &p).unwrap();
    let ids: Vec<&str> = out.libraries.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["bam1", "bam0"]);
    assert_eq!(out.libraries[0].reads_total, 500);
    assert_eq!(out.libraries[0].reads_mapped, 50);
    assert!(out.libraries[0].has_read_mapping());
}

#[test]
fn test_unknown_library_is_configuration_error() {
    let selection = vec!["bam9".to_string()];
    let p = Stage1Params {
        lib_selection: Some(&selection),
        ..params()
    };
    assert!(matches!(
        run_stage1(&sample_db(), &p),
        Err(PipelineError::Configuration(_))
    ));

    let mut refcov = BTreeMap::new();
    refcov.insert("bam9".to_string(), ReadTotals { total: 1, mapped: 1 });
    let p = Stage1Params {
        refcov: Some(&refcov),
        ..params()
    };
    assert!(matches!(
        run_stage1(&sample_db(), &p),
        Err(PipelineError::Configuration(_))
    ));
}

mod common;

use std::fs;
use std::path::PathBuf;

use capacity_planning::repository::{self, Table};
use capacity_planning::scalars::{self, OTHERS_FILE};
use capacity_planning::solver::MicroLp;
use capacity_planning::{
    CapacityModel, Error, ErrorKind, ModelConfig, Parameters, Repository, ScalarConfig, Sets,
};

use common::{assert_close, tables, try_instance, OTHERS};

fn with_table(demands: &[f64], name: &str, text: &str) -> Result<(Sets, Parameters), Error> {
    let tables = tables(demands).into_iter().map(|(table, original)| {
        let text = match table == name {
            true => text.to_string(),
            false => original,
        };
        Table::from_reader(table, text.as_bytes()).unwrap()
    });
    let repo = Repository::from_tables(tables)?;
    let sets = Sets::new(&repo)?;
    let parameters = Parameters::new(&repo, &ScalarConfig::extract(OTHERS)?, &sets)?;
    Ok((sets, parameters))
}

/// A fresh directory holding the test instance as files
fn data_dir(tag: &str, demands: &[f64]) -> PathBuf {
    let dir = std::env::temp_dir()
        .join(format!("capacity-planning-{}-{}", tag, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    for (name, text) in tables(demands) {
        fs::write(dir.join(format!("{}.csv", name)), text).unwrap();
    }
    fs::write(dir.join(OTHERS_FILE), OTHERS).unwrap();
    dir
}

#[test]
fn missing_utilization_fails_before_solving() {
    let others = OTHERS.replace("yp,m=yp,a= 1.0\n", "");
    let (sets, parameters) = try_instance(&[0.0, 25.0], &others).unwrap();

    let err = CapacityModel::build(&sets, &parameters, &ModelConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::MissingScalar {
            label: scalars::UTILIZATION
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Data);
}

#[test]
fn zero_throughput_is_a_data_error() {
    let (sets, parameters) =
        with_table(&[0.0, 25.0], repository::TESTER_THROUGHPUT, "m,t,throughput\n1,1,0\n").unwrap();

    let err = CapacityModel::build(&sets, &parameters, &ModelConfig::default()).unwrap_err();
    assert!(matches!(err, Error::ZeroCapacity { resource: "tester", .. }));
    assert_eq!(err.kind(), ErrorKind::Data);
}

#[test]
fn missing_demand_row_names_the_key() {
    let (sets, parameters) =
        with_table(&[0.0, 25.0], repository::DEMANDS, "p,t,demand\n1,1,0\n").unwrap();

    let err = CapacityModel::build(&sets, &parameters, &ModelConfig::default()).unwrap_err();
    match err {
        Error::MissingKey { table, key } => {
            assert_eq!(table, "demand_mts");
            assert_eq!(key, "2,1");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn malformed_cell_is_reported_with_its_position() {
    let err =
        with_table(&[0.0], repository::TESTER_ABILITY, "m,t,ability\n1,1,fast\n").unwrap_err();
    assert!(matches!(err, Error::MalformedValue { row: 1, .. }));
    assert_eq!(err.kind(), ErrorKind::Data);
}

#[test]
fn instance_loads_from_a_directory() {
    let dir = data_dir("load", &[0.0, 25.0]);

    let repo = Repository::load(&dir).unwrap();
    let scalars = ScalarConfig::read(&dir).unwrap();
    assert!(scalars.gaps().is_empty());

    let sets = Sets::new(&repo).unwrap();
    let parameters = Parameters::new(&repo, &scalars, &sets).unwrap();
    parameters.ensure_complete(&sets).unwrap();

    let model = CapacityModel::build(&sets, &parameters, &ModelConfig::default()).unwrap();
    let plan = model.solve(&MicroLp, &sets).unwrap();
    assert_close(plan.capital.values().sum(), 1499.1);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_table_file_is_named() {
    let dir = data_dir("missing", &[0.0, 25.0]);
    fs::remove_file(dir.join(format!("{}.csv", repository::DEMANDS))).unwrap();

    match Repository::load(&dir) {
        Err(Error::MissingTable(name)) => assert_eq!(name, repository::DEMANDS),
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
    fs::remove_dir_all(&dir).unwrap();
}

//! Loading of the per-entity csv parameter tables of a data directory.

mod param;
mod table;

pub use param::Param;
pub use table::{Entry, MultiKey, Table};

use std::{collections::HashMap, path::Path};

use log::{debug, info};

use crate::error::Error;

pub const HANDLER_INITIAL_PRICE: &str = "handler_initial_price";
pub const HANDLER_BORROW_PRICE: &str = "handler_borrow_price";
pub const HANDLER_ABILITY: &str = "handler_ability";
pub const HANDLER_SALVAGE_PRICE: &str = "handler_salvage_price";
pub const HANDLER_THROUGHPUT: &str = "handler_throughput";
pub const TESTER_INITIAL_PRICE: &str = "tester_initial_price";
pub const TESTER_BORROW_PRICE: &str = "tester_borrow_price";
pub const TESTER_ABILITY: &str = "tester_ability";
pub const TESTER_SALVAGE_PRICE: &str = "tester_salvage_price";
pub const TESTER_THROUGHPUT: &str = "tester_throughput";
pub const PRODUCT_PROFIT: &str = "product_profit";
pub const DEMANDS: &str = "demands";

/// Every table a data directory must provide
pub const TABLES: [&str; 12] = [
    HANDLER_INITIAL_PRICE,
    HANDLER_BORROW_PRICE,
    HANDLER_ABILITY,
    HANDLER_SALVAGE_PRICE,
    HANDLER_THROUGHPUT,
    TESTER_INITIAL_PRICE,
    TESTER_BORROW_PRICE,
    TESTER_ABILITY,
    TESTER_SALVAGE_PRICE,
    TESTER_THROUGHPUT,
    PRODUCT_PROFIT,
    DEMANDS,
];

/// The raw parameter tables of one problem instance, keyed by table name.
#[derive(Debug, Clone)]
pub struct Repository {
    tables: HashMap<String, Table>,
}

impl Repository {
    /// Reads `<dir>/<table>.csv` for every required table.
    pub fn load(dir: &Path) -> Result<Repository, Error> {
        info!("Loading parameter tables from {}", dir.display());
        let tables = TABLES
            .iter()
            .map(|name| Table::from_path(&dir.join(format!("{}.csv", name))))
            .collect::<Result<Vec<_>, _>>()?;
        Repository::from_tables(tables)
    }

    /// Builds a repository from tables that were read elsewhere, checking that none is missing.
    pub fn from_tables<I>(tables: I) -> Result<Repository, Error>
    where
        I: IntoIterator<Item = Table>,
    {
        let tables: HashMap<String, Table> = tables
            .into_iter()
            .map(|t| (t.name().to_string(), t))
            .collect();

        for name in TABLES {
            match tables.get(name) {
                Some(t) => debug!("table {}: {} rows", name, t.len()),
                None => return Err(Error::MissingTable(name.to_string())),
            }
        }

        Ok(Repository { tables })
    }

    pub fn table(&self, name: &str) -> Result<&Table, Error> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::MissingTable(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_is_required() {
        let tables = TABLES
            .iter()
            .filter(|&&name| name != DEMANDS)
            .map(|name| Table::from_reader(name, "x,y\n1,2\n".as_bytes()).unwrap());

        match Repository::from_tables(tables) {
            Err(Error::MissingTable(name)) => assert_eq!(name, DEMANDS),
            other => panic!("unexpected {:?}", other),
        }
    }
}

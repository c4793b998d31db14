use std::fmt::{self, Debug, Display};

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

macro_rules! id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into,
            Serialize, Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            pub const fn new(id: u32) -> Self {
                Self(id)
            }

            pub fn get(self) -> u32 {
                self.0
            }
        }

        impl Label for $name {
            fn label(&self) -> String {
                self.0.to_string()
            }
        }

        impl Key for $name {
            const ARITY: usize = 1;

            fn from_parts(parts: &[u32]) -> Self {
                Self(parts[0])
            }
        }
    };
}

id!(
    /// A planning period as numbered in the source data
    PeriodId
);
id!(
    /// A tester type
    TesterId
);
id!(
    /// A handler category
    CategoryId
);
id!(
    /// A numbered handler instance within a category
    HandlerId
);
id!(
    /// An acquisition route for additional equipment
    ChannelId
);
id!(
    /// A product
    ProductId
);

/// A stochastic realization. The deterministic model has exactly one, the nominal scenario.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into, Serialize,
    Deserialize,
)]
pub struct ScenarioId(usize);

impl ScenarioId {
    pub const NOMINAL: ScenarioId = ScenarioId(0);

    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Label for ScenarioId {
    fn label(&self) -> String {
        self.0.to_string()
    }
}

/// A point on the planning horizon. `Initial` is the boundary state before the first
/// planning period, where capital, stock and capacity loading take their given values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Period {
    Initial,
    Planning(PeriodId),
}

impl Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Initial => write!(f, "init"),
            Period::Planning(p) => write!(f, "{}", p),
        }
    }
}

impl From<PeriodId> for Period {
    fn from(p: PeriodId) -> Self {
        Period::Planning(p)
    }
}

impl Label for Period {
    fn label(&self) -> String {
        self.to_string()
    }
}

/// Textual form of an index tuple, used for variable and constraint names.
pub trait Label {
    fn label(&self) -> String;
}

/// An index tuple that can be read from the integer key columns of a table.
pub trait Key: Label + Copy + Ord + Debug {
    /// Number of key columns
    const ARITY: usize;

    /// Build the key from exactly `ARITY` column values
    fn from_parts(parts: &[u32]) -> Self;
}

macro_rules! tuple_index {
    ($arity:expr; $($t:ident . $i:tt),+) => {
        impl<$($t: Label),+> Label for ($($t,)+) {
            fn label(&self) -> String {
                [$(self.$i.label()),+].join(",")
            }
        }

        impl<$($t: Key),+> Key for ($($t,)+) {
            const ARITY: usize = $arity;

            fn from_parts(parts: &[u32]) -> Self {
                ($($t::from_parts(&parts[$i..$i + 1]),)+)
            }
        }
    };
}

tuple_index!(2; A.0, B.1);
tuple_index!(3; A.0, B.1, C.2);
tuple_index!(4; A.0, B.1, C.2, D.3);
tuple_index!(5; A.0, B.1, C.2, D.3, E.4);
tuple_index!(6; A.0, B.1, C.2, D.3, E.4, F.5);

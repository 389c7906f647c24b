/// Closed table of functions callable from Mercu programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Print,
    ConnectDb,
    CreateApi,
    DbCreateTable,
    DbInsert,
    DbQuery,
}

/// Number of arguments a built-in accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    Variadic,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(expected) => expected == count,
            Arity::Variadic => true,
        }
    }
}

impl Builtin {
    pub const ALL: [Builtin; 6] = [
        Self::Print,
        Self::ConnectDb,
        Self::CreateApi,
        Self::DbCreateTable,
        Self::DbInsert,
        Self::DbQuery,
    ];

    /// Case-sensitive lookup over [`Builtin::ALL`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::ConnectDb => "connect_db",
            Self::CreateApi => "create_api",
            Self::DbCreateTable => "db_create_table",
            Self::DbInsert => "db_insert",
            Self::DbQuery => "db_query",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Self::Print => Arity::Variadic,
            Self::ConnectDb | Self::CreateApi | Self::DbQuery => Arity::Exactly(1),
            Self::DbCreateTable | Self::DbInsert => Arity::Exactly(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Arity, Builtin};

    #[test]
    fn names_round_trip() {
        for builtin in Builtin::ALL {
            assert_eq!(Builtin::from_name(builtin.name()), Some(builtin));
        }
        assert_eq!(Builtin::from_name("len"), None);
        assert_eq!(Builtin::from_name("Print"), None);
    }

    #[test]
    fn arity_checks() {
        assert!(Builtin::Print.arity().accepts(0));
        assert!(Builtin::Print.arity().accepts(5));
        assert_eq!(Builtin::DbInsert.arity(), Arity::Exactly(2));
        assert!(!Builtin::DbQuery.arity().accepts(2));
    }
}

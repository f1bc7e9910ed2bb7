//! Store handles handed to the service layer.
//!
//! The same pool backs both handles. The split is a typing convention, not
//! an enforced permission: [`ReadClient::conn`] still hands out the full
//! connection because SeaORM's query builders need it. What the types do
//! guarantee is which service can be *given* which handle. Progress fetchers
//! are only ever constructed from a [`ReadClient`], while authoring and
//! password-reset flows take an [`AdminClient`]. Enforcing read-only access
//! needs a separate read-only connection (e.g. SQLite `mode=ro`) passed to
//! [`ReadClient::new`].

use sea_orm::DatabaseConnection;

/// Handle for the read path. Code holding it is expected to issue only
/// `SELECT`s; the connection itself is not restricted.
#[derive(Clone, Debug)]
pub struct ReadClient {
    conn: DatabaseConnection,
}

impl ReadClient {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }
}

/// Elevated capability: inserts, updates and ordered deletes.
#[derive(Clone, Debug)]
pub struct AdminClient {
    conn: DatabaseConnection,
}

impl AdminClient {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// A read handle over the same pool.
    pub fn read_only(&self) -> ReadClient {
        ReadClient::new(self.conn.clone())
    }
}

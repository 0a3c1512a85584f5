use tokio_util::sync::CancellationToken;

use super::Session;
use crate::error::ProvisionError;
use crate::postgres::quote::{quote_identifier, quote_literal};

/// Build the statement that creates login role `name` unless it exists.
///
/// The catalog check and the `CREATE ROLE` run inside one anonymous block,
/// so repeating the statement is a no-op once the role exists. The block's
/// dollar-quote tag never occurs in the quoted name or password.
#[must_use]
pub fn create_role_statement(name: &str, password: &str) -> String {
    let body = format!(
        "\n\
         BEGIN\n\
         \x20  IF NOT EXISTS (\n\
         \x20     SELECT FROM pg_catalog.pg_roles\n\
         \x20     WHERE  rolname = {}) THEN\n\
         \n\
         \x20     CREATE ROLE {} LOGIN PASSWORD {} NOCREATEDB;\n\
         \x20  END IF;\n\
         END\n",
        quote_literal(name),
        quote_identifier(name),
        quote_literal(password),
    );
    let tag = dollar_tag(&body);
    format!("DO\n{tag}{body}{tag};")
}

/// First of `$do$`, `$do_1$`, `$do_2$`, ... that does not appear in `body`.
fn dollar_tag(body: &str) -> String {
    let mut tag = "$do$".to_string();
    let mut n = 0u32;
    while body.contains(&tag) {
        n += 1;
        tag = format!("$do_{n}$");
    }
    tag
}

/// Ensure login role `name` exists, created with `password` and without
/// database creation rights. An existing role is left untouched, password
/// included.
///
/// # Errors
/// Returns [`ProvisionError::RoleProvisioning`] if the server rejects the
/// statement.
pub async fn ensure_role(
    cancel: &CancellationToken,
    session: &dyn Session,
    name: &str,
    password: &str,
) -> Result<(), ProvisionError> {
    session
        .execute(cancel, &create_role_statement(name, password))
        .await
        .map_err(|source| ProvisionError::RoleProvisioning {
            role: name.to_string(),
            source,
        })
}

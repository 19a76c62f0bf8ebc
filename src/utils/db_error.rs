fn is_unique_violation_on(e: &sqlx::Error, constraint: &str) -> bool {
    let Some(db_err) = e.as_database_error() else {
        return false;
    };

    if !db_err.is_unique_violation() {
        return false;
    }

    db_err.constraint() == Some(constraint)
}

pub fn is_unique_violation_on_name(e: &sqlx::Error) -> bool {
    is_unique_violation_on(e, "index_domains_on_name")
}

/// A second domain for the same newsletter.
pub fn is_unique_violation_on_newsletter(e: &sqlx::Error) -> bool {
    is_unique_violation_on(e, "index_domains_on_newsletter_id")
}

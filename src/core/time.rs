use time::{OffsetDateTime, PrimitiveDateTime};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_now_matches_utc_clock() {
        let before = OffsetDateTime::now_utc();
        let now = primitive_now_utc().assume_utc();
        let after = OffsetDateTime::now_utc();
        assert!(before <= now && now <= after);
    }
}

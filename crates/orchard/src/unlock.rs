//! When a letter may be opened.
//!
//! A letter opens when its author marked it unlocked and the local wall clock has
//! reached one second past midnight on its unlock date. Times are naive local times:
//! no timezone conversion happens anywhere.

use crate::letters::Letter;
use chrono::{Local, NaiveDateTime, NaiveTime};

/// Time of day at which letters ripen.
pub fn unlock_time() -> NaiveTime {
    NaiveTime::from_hms_opt(0, 0, 1).unwrap_or(NaiveTime::MIN)
}

/// The local instant from which `letter` may be opened.
pub fn unlock_instant(letter: &Letter) -> NaiveDateTime {
    letter.unlock_date.and_time(unlock_time())
}

pub fn is_unlocked(letter: &Letter, now: NaiveDateTime) -> bool {
    letter.unlocked && now >= unlock_instant(letter)
}

pub fn is_unlocked_now(letter: &Letter) -> bool {
    is_unlocked(letter, Local::now().naive_local())
}

/// Label for the locked-fruit tooltip.
pub fn ripens_on(letter: &Letter) -> String {
    format!("Ripens on {}", unlock_instant(letter).format("%B %-d, %Y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::letters::tests::letter;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, s))
            .unwrap()
    }

    #[test]
    fn author_lock_always_wins() {
        let l = letter("a", false, "2000-01-01");
        assert!(!is_unlocked(&l, at(2099, 1, 1, 12, 0, 0)));
        assert!(!is_unlocked_now(&l));
    }

    #[test]
    fn opens_one_second_after_midnight() {
        let l = letter("a", true, "2024-03-10");
        assert!(!is_unlocked(&l, at(2024, 3, 10, 0, 0, 0)));
        assert!(is_unlocked(&l, at(2024, 3, 10, 0, 0, 1)));
        assert!(is_unlocked(&l, at(2024, 3, 11, 9, 30, 0)));
    }

    #[test]
    fn new_year_boundary() {
        let l = letter("a", true, "2024-01-01");
        assert!(is_unlocked(&l, at(2024, 1, 1, 0, 0, 1)));
        assert!(!is_unlocked(&l, at(2023, 12, 31, 23, 59, 59)));
    }

    #[test]
    fn past_letters_are_open_now() {
        let l = letter("a", true, "2000-01-01");
        assert!(is_unlocked_now(&l));
    }

    #[test]
    fn tooltip_names_the_unlock_day() {
        let l = letter("a", true, "2031-06-01");
        assert_eq!(ripens_on(&l), "Ripens on June 1, 2031");
    }
}

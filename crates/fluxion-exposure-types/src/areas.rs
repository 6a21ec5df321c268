// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.

use chrono_tz::Tz;

/// Map a bidding-zone code to the timezone its day-ahead market settles in.
///
/// Codes are matched case-insensitively and `-` is accepted in place of `_`
/// (`se3`, `SE-3` and `SE_3` all resolve). Returns `None` for unknown zones.
#[must_use]
pub fn timezone_for_area(area_code: &str) -> Option<Tz> {
    let code = area_code.trim().to_ascii_uppercase().replace('-', "_");
    let tz = match code.as_str() {
        "SE" | "SE1" | "SE2" | "SE3" | "SE4" | "SE_1" | "SE_2" | "SE_3" | "SE_4" => {
            chrono_tz::Europe::Stockholm
        }
        "NO" | "NO1" | "NO2" | "NO3" | "NO4" | "NO5" | "NO_1" | "NO_2" | "NO_3" | "NO_4"
        | "NO_5" => chrono_tz::Europe::Oslo,
        "DK" | "DK1" | "DK2" | "DK_1" | "DK_2" => chrono_tz::Europe::Copenhagen,
        "FI" => chrono_tz::Europe::Helsinki,
        "EE" => chrono_tz::Europe::Tallinn,
        "LV" => chrono_tz::Europe::Riga,
        "LT" => chrono_tz::Europe::Vilnius,
        "DE" | "DE_LU" => chrono_tz::Europe::Berlin,
        "NL" => chrono_tz::Europe::Amsterdam,
        "BE" => chrono_tz::Europe::Brussels,
        "FR" => chrono_tz::Europe::Paris,
        "AT" => chrono_tz::Europe::Vienna,
        "PL" => chrono_tz::Europe::Warsaw,
        "CZ" => chrono_tz::Europe::Prague,
        _ => return None,
    };
    Some(tz)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swedish_areas() {
        for code in ["SE_1", "SE_2", "SE_3", "SE_4", "se3", "SE-4"] {
            assert_eq!(timezone_for_area(code), Some(chrono_tz::Europe::Stockholm));
        }
    }

    #[test]
    fn test_other_zones() {
        assert_eq!(timezone_for_area("NO_2"), Some(chrono_tz::Europe::Oslo));
        assert_eq!(timezone_for_area("DE_LU"), Some(chrono_tz::Europe::Berlin));
        assert_eq!(timezone_for_area("CZ"), Some(chrono_tz::Europe::Prague));
    }

    #[test]
    fn test_unknown_area() {
        assert_eq!(timezone_for_area("XX_9"), None);
        assert_eq!(timezone_for_area(""), None);
    }
}

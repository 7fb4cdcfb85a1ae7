/// Kody ISO2 → nazwy krajów używane w całej aplikacji
const COUNTRIES: [(&str, &str); 36] = [
    ("BE", "Belgium"), ("BG", "Bulgaria"), ("CZ", "Czechia"),
    ("DK", "Denmark"), ("DE", "Germany"), ("EE", "Estonia"),
    ("IE", "Ireland"), ("GR", "Greece"), ("ES", "Spain"),
    ("FR", "France"), ("HR", "Croatia"), ("IT", "Italy"),
    ("CY", "Cyprus"), ("LV", "Latvia"), ("LT", "Lithuania"),
    ("LU", "Luxembourg"), ("HU", "Hungary"), ("MT", "Malta"),
    ("NL", "Netherlands"), ("AT", "Austria"), ("PL", "Poland"),
    ("PT", "Portugal"), ("RO", "Romania"), ("SI", "Slovenia"),
    ("SK", "Slovakia"), ("FI", "Finland"), ("SE", "Sweden"),
    ("IS", "Iceland"), ("NO", "Norway"), ("CH", "Switzerland"),
    ("GB", "United Kingdom"), ("BA", "Bosnia and Herzegovina"), ("ME", "Montenegro"),
    ("MK", "North Macedonia"), ("RS", "Serbia"), ("TR", "Türkiye"),
];

pub fn all() -> &'static [(&'static str, &'static str)] {
    &COUNTRIES
}

pub fn code_to_name(code: &str) -> Option<&'static str> {
    all().iter().find(|(c, _)| *c == code).map(|(_, name)| *name)
}

pub fn name_to_code(name: &str) -> Option<&'static str> {
    all().iter().find(|(_, n)| *n == name).map(|(code, _)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_round_trips() {
        for (code, _) in all() {
            let name = code_to_name(code).unwrap();
            assert_eq!(name_to_code(name), Some(*code));
        }
    }

    #[test]
    fn unknown_keys_are_absent() {
        assert_eq!(code_to_name("EU27_2020"), None);
        assert_eq!(code_to_name("EL"), None);
        assert_eq!(name_to_code("Euro area - 20 countries (from 2023)"), None);
    }

    #[test]
    fn table_has_unique_entries() {
        let mut codes: Vec<_> = all().iter().map(|(c, _)| *c).collect();
        let mut names: Vec<_> = all().iter().map(|(_, n)| *n).collect();
        codes.sort();
        codes.dedup();
        names.sort();
        names.dedup();
        assert_eq!(codes.len(), 36);
        assert_eq!(names.len(), 36);
    }
}

//存放一些辅助函数

/***************************************/
/***********  目录       Start ******************/
/***************************************/
/*1 名称合法性检查     */
/*2 字符串处理函数     */
/***************************************/
/*********** 目录        End ******************/
/***************************************/

/***************************************/
/***********1 名称合法性检查          Start ******************/
/***************************************/

/// Legal characters of a component name: alphanumeric or '_'.
pub fn chk_comp_name_legal(input_str: &str) -> bool {
    input_str
        .chars()
        .all(|e| e.is_ascii_alphanumeric() || e == '_')
}

/// `tAsciName`: a letter followed by letters, digits or '_'.
pub fn chk_asci_name_legal(input_str: &str) -> bool {
    match input_str.chars().next() {
        Some(first) if first.is_ascii_alphabetic() => chk_comp_name_legal(input_str),
        _ => false,
    }
}

/***************************************/
/***********1 名称合法性检查          End ******************/
/***************************************/

/***************************************/
/***********2 字符串处理函数          Start ******************/
/***************************************/

// 大小不敏感的  比较字符串是否相等
pub fn check_eq_2str_incaseinse(a: &str, b: &str) -> bool {
    a.to_ascii_lowercase() == b.to_ascii_lowercase()
}

/// Case-insensitive substring test used by the selection list filters.
pub fn contains_incaseinse(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

/// First `<prefix>_NNN` (counting from 001) not contained in `existing`.
pub fn unique_name<'a>(prefix: &str, existing: impl IntoIterator<Item = &'a str>) -> String {
    let taken: Vec<&str> = existing.into_iter().collect();
    let mut index = 1u32;
    loop {
        let candidate = format!("{}_{:03}", prefix, index);
        if !taken.contains(&candidate.as_str()) {
            return candidate;
        }
        index += 1;
    }
}

/// Joins the non-empty parts with a single space.
pub fn join_non_empty(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/***************************************/
/***********2 字符串处理函数          End ******************/
/***************************************/

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asci_name_must_start_with_letter() {
        assert!(chk_asci_name_legal("GCB_01"));
        assert!(!chk_asci_name_legal("1GCB"));
        assert!(!chk_asci_name_legal("GCB 01"));
        assert!(!chk_asci_name_legal(""));
    }

    #[test]
    fn unique_name_skips_taken() {
        let name = unique_name("newDataSet", ["newDataSet_001", "newDataSet_002"]);
        assert_eq!(name, "newDataSet_003");
        assert_eq!(unique_name("newGSE", []), "newGSE_001");
    }

    #[test]
    fn join_drops_empty_parts() {
        assert_eq!(join_non_empty(&["", "LLN0", ""]), "LLN0");
        assert_eq!(join_non_empty(&["Bay", "MMXU", "1"]), "Bay MMXU 1");
    }

    #[test]
    fn incaseinse_compare() {
        assert!(check_eq_2str_incaseinse("True", "true"));
        assert!(contains_incaseinse("IED1>>LD1>LLN0>smv2", "SMV2"));
    }
}

//! Title reconstruction: rejoin titles that the page width wrapped.
//!
//! Titles run across as many physical lines as the column width demands and
//! the wrap point carries no marker. Lines are glued together until the
//! buffer ends the way a legislative title ends (`…について`, `…予算`,
//! `…意見書`, `…条例`, a closing parenthesis, …). Pairing in
//! [`crate::pipeline::assemble`] is positional, so what matters most is that
//! the number of titles produced matches the number of results in the block.

use crate::pipeline::layout::LayoutRules;

/// Reconstruct complete titles from a segment's candidate lines.
pub fn reconstruct_titles<S: AsRef<str>>(lines: &[S], rules: &dyn LayoutRules) -> Vec<String> {
    let max_chars = rules.max_title_chars();
    let mut titles = Vec::new();
    let mut current = String::new();

    for line in lines {
        current.push_str(line.as_ref());

        if rules.is_title_complete(&current) || current.chars().count() > max_chars {
            titles.push(current.trim().to_string());
            current.clear();
        }
    }

    if !current.trim().is_empty() {
        titles.push(current.trim().to_string());
    }

    titles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::layout::DefaultLayout;

    #[test]
    fn two_line_wrap_joins_into_one_title() {
        let lines = ["新得町農業振興に", "関する条例の一部を改正する条例"];
        let titles = reconstruct_titles(&lines, &DefaultLayout);
        assert_eq!(titles, vec!["新得町農業振興に関する条例の一部を改正する条例"]);
    }

    #[test]
    fn consecutive_titles_split_on_endings() {
        let lines = [
            "令和6年度新得町一般会計補正予算",
            "新得町過疎地域持続的発展計画の",
            "変更について",
            "地方財政の充実・強化を求める意見書",
        ];
        let titles = reconstruct_titles(&lines, &DefaultLayout);
        assert_eq!(
            titles,
            vec![
                "令和6年度新得町一般会計補正予算",
                "新得町過疎地域持続的発展計画の変更について",
                "地方財政の充実・強化を求める意見書",
            ]
        );
    }

    #[test]
    fn unterminated_run_is_cut_at_length_ceiling() {
        let long_line = "あ".repeat(70);
        let lines = [long_line.as_str(), long_line.as_str(), "残り"];
        let titles = reconstruct_titles(&lines, &DefaultLayout);
        assert_eq!(titles.len(), 2);
        assert_eq!(titles[0].chars().count(), 140);
        assert_eq!(titles[1], "残り");
    }

    #[test]
    fn empty_input_gives_no_titles() {
        let lines: [&str; 0] = [];
        assert!(reconstruct_titles(&lines, &DefaultLayout).is_empty());
    }
}

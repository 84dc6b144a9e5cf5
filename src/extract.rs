//! Extraction of race metadata and runner records from one result page.
//!
//! Nothing here fails: a field the page does not carry falls back to
//! [`NOT_FOUND`] (race level) or an empty string (runner level).

use itertools::{izip, Itertools};
use rpscrape_utils::{regex, selector};
use scraper::{ElementRef, Html, Selector};

use crate::{
    reconcile::{self, reconcile, RunnerColumns},
    schema::{RaceLocation, RaceMeta, RunnerRecord, NOT_FOUND},
};

pub fn extract(html: &Html, location: &RaceLocation) -> (RaceMeta, Vec<RunnerRecord>) {
    let meta = parse_race_meta(html, location.name().as_str());
    let runners = parse_runners(html).into_records();
    (meta, runners)
}

/// Text nodes directly under `element`, in document order.
fn own_texts<'a>(element: ElementRef<'a>) -> impl Iterator<Item = &'a str> + 'a {
    element
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| &**text)
}

fn texts(html: &Html, selector: &Selector) -> Vec<String> {
    html.select(selector)
        .flat_map(own_texts)
        .map(str::to_owned)
        .collect()
}

fn first_text(html: &Html, selector: &Selector) -> Option<String> {
    html.select(selector)
        .flat_map(own_texts)
        .next()
        .map(str::to_owned)
}

pub fn rewrite_fractions(s: &str) -> String {
    s.replace('¼', ".25").replace('½', ".5").replace('¾', ".75")
}

fn strip_parens(s: &str) -> &str {
    s.trim_matches(|c| c == '(' || c == ')')
}

fn clean(s: &str) -> String {
    s.trim().replace('–', "")
}

pub fn parse_race_meta(html: &Html, course: &str) -> RaceMeta {
    let date = first_text(html, selector!("span[data-test-selector='text-raceDate']"))
        .map(|s| s.trim().to_owned());
    let time = first_text(html, selector!("span[data-test-selector='text-raceTime']"))
        .map(|s| s.trim().to_owned());

    let title = first_text(html, selector!("h2[class='rp-raceTimeCourseName__title']"))
        .map(|s| s.trim().replace(',', " "))
        .unwrap_or_else(|| NOT_FOUND.to_owned());
    let (title, class) = split_class_annotation(&title);
    let mut class = class.unwrap_or_else(|| {
        first_text(html, selector!("span[class='rp-raceTimeCourseName_class']"))
            .map(|s| strip_parens(s.trim()).to_owned())
            .unwrap_or_else(|| NOT_FOUND.to_owned())
    });

    let mut band = first_text(
        html,
        selector!("span[class='rp-raceTimeCourseName_ratingBandAndAgesAllowed']"),
    )
    .map(|s| strip_parens(s.trim()).to_owned())
    .unwrap_or_else(|| NOT_FOUND.to_owned());
    if band.contains(',') {
        let mut parts = band.split(',');
        let (first, second) = (parts.next(), parts.next());
        class = first.unwrap_or_default().to_owned();
        band = second.unwrap_or_default().to_owned();
    }
    let (title, band) = split_sex_qualifier(&title, band);

    let distance = first_text(html, selector!("span[class='rp-raceTimeCourseName_distance']"))
        .map(|s| rewrite_fractions(&s.chars().filter(|c| !c.is_whitespace()).collect::<String>()));
    let going = first_text(html, selector!("span[class='rp-raceTimeCourseName_condition']"))
        .map(|s| s.trim().to_owned());

    let or_not_found = |value: Option<String>| value.unwrap_or_else(|| NOT_FOUND.to_owned());
    RaceMeta::builder()
        .date(or_not_found(date))
        .course(course.to_owned())
        .time(or_not_found(time))
        .title(title.split_whitespace().join(" "))
        .class(class)
        .band(band)
        .distance(or_not_found(distance))
        .going(or_not_found(going))
        .build()
}

/// Pulls a `(Group 1)`, `(Grade 2)` or `(Listed Race)` annotation out of the title.
fn split_class_annotation(title: &str) -> (String, Option<String>) {
    if let Some(captures) = regex!(r"\((Gr(?:oup|ade)[^)]*)\)").captures(title) {
        let class = captures[1].trim().to_owned();
        (title.replace(&captures[0], ""), Some(class))
    } else if title.contains("(Listed Race)") {
        (title.replace("(Listed Race)", ""), Some("Listed".to_owned()))
    } else {
        (title.to_owned(), None)
    }
}

/// Moves a fillies/mares or colts/geldings restriction from the title into the band.
fn split_sex_qualifier(title: &str, band: String) -> (String, String) {
    if title.contains("(Fillies & Mares)") {
        (
            title.replace("(Fillies & Mares)", ""),
            band + " Fillies & Mares",
        )
    } else if title.contains("Fillies") {
        (title.replace("(Fillies)", ""), band + " Fillies")
    } else if title.contains("(Colts & Geldings)") {
        (
            title.replace("(Colts & Geldings)", ""),
            band + " Colts & Geldings",
        )
    } else {
        (title.to_owned(), band)
    }
}

pub fn parse_runners(html: &Html) -> RunnerColumns {
    let position = reconcile(
        reconcile::POSITION,
        texts(html, selector!("span[data-test-selector='text-horsePosition']")),
        0,
    )
    .iter()
    .map(|s| s.trim().to_owned())
    .collect_vec();
    let canonical = position.len();

    let column = |policy: reconcile::Policy, selector: &Selector, cleanup: fn(&str) -> String| {
        reconcile(policy, texts(html, selector), canonical)
            .iter()
            .map(|s| cleanup(s))
            .collect_vec()
    };

    let prize = column(
        reconcile::PRIZE,
        selector!("div[data-test-selector='text-prizeMoney']"),
        |s| s.trim().replace([',', '£', '€', '$'], ""),
    );
    let draw = column(
        reconcile::AS_IS,
        selector!("sup[class='rp-horseTable__pos__draw']"),
        |s| strip_parens(&clean(s)).to_owned(),
    );
    let beaten = column(
        reconcile::BEATEN,
        selector!("span[class='rp-horseTable__pos__length'] > span"),
        |s| rewrite_fractions(s.trim().trim_matches(|c| c == '[' || c == ']')),
    );
    let name = column(
        reconcile::AS_IS,
        selector!("a[data-test-selector='link-horseName']"),
        clean,
    );
    let starting_price = column(
        reconcile::AS_IS,
        selector!("span[class='rp-horseTable__horse__price']"),
        clean,
    );
    let jockey = column(
        reconcile::JOCKEY,
        selector!("a[data-test-selector='link-jockeyName']"),
        clean,
    );
    let trainer = column(
        reconcile::TRAINER,
        selector!("a[data-test-selector='link-trainerName']"),
        clean,
    );
    let age = column(
        reconcile::AS_IS,
        selector!("td[data-test-selector='horse-age']"),
        clean,
    );
    let official_rating = column(reconcile::AS_IS, selector!("td[data-ending='OR']"), clean);
    let speed_figure = column(reconcile::AS_IS, selector!("td[data-ending='TS']"), clean);
    let rating_figure = column(reconcile::AS_IS, selector!("td[data-ending='RPR']"), clean);
    let comment = column(
        reconcile::AS_IS,
        selector!("tr[class='rp-horseTable__commentRow ng-cloak'] > td"),
        |s| s.trim().replace("  ", "").replace(',', " -"),
    );

    let stones = texts(html, selector!("span[data-ending='st']"));
    let pounds = texts(html, selector!("span[data-ending='lb']"));
    let weight = izip!(stones, pounds)
        .map(|(st, lb)| format!("{}-{}", st.trim(), lb.trim()))
        .collect_vec();

    RunnerColumns {
        position,
        draw,
        beaten,
        name,
        starting_price,
        age,
        weight,
        headgear: parse_headgear(html),
        trainer,
        jockey,
        official_rating,
        speed_figure,
        rating_figure,
        prize,
        comment,
    }
}

/// One entry per weight cell: the headgear marker's text, or empty.
fn parse_headgear(html: &Html) -> Vec<String> {
    html.select(selector!("td[class*='rp-horseTable__wgt']"))
        .map(|cell| {
            cell.children()
                .filter_map(ElementRef::wrap)
                .find(|child| selector!("span[class='rp-horseTable__headGear']").matches(child))
                .and_then(|span| span.first_child())
                .and_then(|node| node.value().as_text().map(|text| text.trim().to_owned()))
                .unwrap_or_default()
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::NaiveDate;
    use scraper::Html;

    use super::{extract, parse_race_meta, parse_runners, rewrite_fractions};
    use crate::{output::CsvSink, schema::RaceLocation};

    pub(crate) const RESULT_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Coronation Stakes result</title></head>
<body>
<div class="rp-raceTimeCourseName">
  <span data-test-selector="text-raceDate">19 Jun 2018</span>
  <span data-test-selector="text-raceTime">4:20</span>
  <h2 class="rp-raceTimeCourseName__title">
    Coronation Stakes, (Group 1) (Fillies)
  </h2>
  <span class="rp-raceTimeCourseName_class">(Class 1)</span>
  <span class="rp-raceTimeCourseName_ratingBandAndAgesAllowed">(3yo)</span>
  <span class="rp-raceTimeCourseName_distance">1m 2½f</span>
  <span class="rp-raceTimeCourseName_condition">Good To Firm</span>
</div>
<div data-test-selector="text-prizeMoney">£500,000</div>
<div data-test-selector="text-prizeMoney">£283,550</div>
<div data-test-selector="text-prizeMoney">£107,500</div>
<table class="rp-horseTable__table">
<tbody>
<tr class="rp-horseTable__mainRow">
  <td><span data-test-selector="text-horsePosition">1</span><span data-test-selector="text-horsePosition">1</span>
    <sup class="rp-horseTable__pos__draw">(4)</sup></td>
  <td><a data-test-selector="link-horseName">Alpha Centauri</a>
    <span class="rp-horseTable__horse__price">11/4F</span></td>
  <td data-test-selector="horse-age">3</td>
  <td class="rp-horseTable__wgt rp-horseTable__wgt_x"><span data-ending="st">9</span><span data-ending="lb">0</span><span class="rp-horseTable__headGear">t</span></td>
  <td><a data-test-selector="link-jockeyName"> <sup></sup>C O'Donoghue</a></td>
  <td><a data-test-selector="link-trainerName"> <sup></sup>Mrs John Harrington</a></td>
  <td data-ending="OR">112</td>
  <td data-ending="TS">98</td>
  <td data-ending="RPR">121</td>
</tr>
<tr class="rp-horseTable__commentRow ng-cloak"><td colspan="9">Made all, quickened clear</td></tr>
<tr class="rp-horseTable__mainRow">
  <td><span data-test-selector="text-horsePosition">2</span><span data-test-selector="text-horsePosition">2</span>
    <sup class="rp-horseTable__pos__draw">(9)</sup>
    <span class="rp-horseTable__pos__length"><span>6</span><span>[6]</span></span></td>
  <td><a data-test-selector="link-horseName">Threading</a>
    <span class="rp-horseTable__horse__price">9/2</span></td>
  <td data-test-selector="horse-age">3</td>
  <td class="rp-horseTable__wgt"><span data-ending="st">9</span><span data-ending="lb">0</span></td>
  <td><a data-test-selector="link-jockeyName"> <sup>3</sup>J Doyle</a></td>
  <td><a data-test-selector="link-trainerName"> <sup></sup>M Johnston</a></td>
  <td data-ending="OR">–</td>
  <td data-ending="TS">–</td>
  <td data-ending="RPR">107</td>
</tr>
<tr class="rp-horseTable__commentRow ng-cloak"><td colspan="9">Chased winner</td></tr>
<tr class="rp-horseTable__mainRow">
  <td><span data-test-selector="text-horsePosition">3</span><span data-test-selector="text-horsePosition">3</span>
    <sup class="rp-horseTable__pos__draw">(1)</sup>
    <span class="rp-horseTable__pos__length"><span>½</span><span>[6½]</span></span></td>
  <td><a data-test-selector="link-horseName">Veracious</a>
    <span class="rp-horseTable__horse__price">14/1</span></td>
  <td data-test-selector="horse-age">3</td>
  <td class="rp-horseTable__wgt"><span data-ending="st">9</span><span data-ending="lb">0</span><span class="rp-horseTable__headGear">h</span></td>
  <td><a data-test-selector="link-jockeyName"> <sup></sup>R Moore</a></td>
  <td><a data-test-selector="link-trainerName"> <sup></sup>Sir Michael Stoute</a></td>
  <td data-ending="OR">109</td>
  <td data-ending="TS">95</td>
  <td data-ending="RPR">105</td>
</tr>
<tr class="rp-horseTable__commentRow ng-cloak"><td colspan="9">Kept on</td></tr>
</tbody>
</table>
</body>
</html>"#;

    pub(crate) fn location() -> RaceLocation {
        RaceLocation::builder()
            .track("2".to_owned().into())
            .name("Ascot".to_owned().into())
            .date(NaiveDate::from_ymd_opt(2018, 6, 22).unwrap())
            .race_instance_uid(704_112.into())
            .build()
    }

    fn meta_for(head: &str) -> crate::schema::RaceMeta {
        let html = Html::parse_document(&format!("<html><body>{head}</body></html>"));
        parse_race_meta(&html, "Ascot")
    }

    #[test]
    fn race_meta_from_page() {
        let html = Html::parse_document(RESULT_PAGE);
        let (meta, _) = extract(&html, &location());
        assert_eq!(meta.date(), "19 Jun 2018");
        assert_eq!(meta.course(), "Ascot");
        assert_eq!(meta.time(), "4:20");
        assert_eq!(meta.title(), "Coronation Stakes");
        assert_eq!(meta.class(), "Group 1");
        assert_eq!(meta.band(), "3yo Fillies");
        assert_eq!(meta.distance(), "1m2.5f");
        assert_eq!(meta.going(), "Good To Firm");
    }

    #[test]
    fn runners_from_page() {
        let html = Html::parse_document(RESULT_PAGE);
        let (_, runners) = extract(&html, &location());
        assert_eq!(runners.len(), 3);

        let winner = &runners[0];
        assert_eq!(winner.position(), "1");
        assert_eq!(winner.draw(), "4");
        assert_eq!(winner.beaten(), "");
        assert_eq!(winner.name(), "Alpha Centauri");
        assert_eq!(winner.starting_price(), "11/4F");
        assert_eq!(winner.age(), "3");
        assert_eq!(winner.weight(), "9-0");
        assert_eq!(winner.headgear(), "t");
        assert_eq!(winner.jockey(), "C O'Donoghue");
        assert_eq!(winner.trainer(), "Mrs John Harrington");
        assert_eq!(winner.official_rating(), "112");
        assert_eq!(winner.speed_figure(), "98");
        assert_eq!(winner.rating_figure(), "121");
        assert_eq!(winner.prize(), "283550");
        assert_eq!(winner.comment(), "Made all - quickened clear");

        let second = &runners[1];
        assert_eq!(second.beaten(), "6");
        assert_eq!(second.headgear(), "");
        assert_eq!(second.jockey(), "J Doyle");
        assert_eq!(second.official_rating(), "");
        assert_eq!(second.speed_figure(), "");
        assert_eq!(second.prize(), "107500");

        let third = &runners[2];
        assert_eq!(third.position(), "3");
        assert_eq!(third.draw(), "1");
        assert_eq!(third.beaten(), ".5");
        assert_eq!(third.headgear(), "h");
        assert_eq!(third.prize(), "");
        assert_eq!(third.comment(), "Kept on");
    }

    #[test]
    fn record_count_follows_positions() {
        let html = Html::parse_document(RESULT_PAGE);
        let columns = parse_runners(&html);
        assert_eq!(columns.position, ["1", "2", "3"]);
        assert_eq!(columns.beaten, ["", "6", ".5"]);
        assert_eq!(columns.prize, ["283550", "107500", ""]);
        assert_eq!(columns.row_count(), columns.position.len());
    }

    #[test]
    fn empty_page_degrades_to_defaults() {
        let html = Html::parse_document("<html><body><p>Page not found</p></body></html>");
        let (meta, runners) = extract(&html, &location());
        for field in [
            meta.date(),
            meta.time(),
            meta.title(),
            meta.class(),
            meta.band(),
            meta.distance(),
            meta.going(),
        ] {
            assert_eq!(field, "not found");
        }
        assert_eq!(meta.course(), "Ascot");
        assert!(runners.is_empty());
    }

    #[test]
    fn fraction_glyphs() {
        assert_eq!(rewrite_fractions("2m¼"), "2m.25");
        assert_eq!(rewrite_fractions("1¾"), "1.75");
        assert_eq!(rewrite_fractions("nk"), "nk");
        let meta = meta_for(r#"<span class="rp-raceTimeCourseName_distance">2m¼</span>"#);
        assert_eq!(meta.distance(), "2m.25");
    }

    #[test]
    fn group_annotation_becomes_class() {
        let meta = meta_for(
            r#"<h2 class="rp-raceTimeCourseName__title">Example Group 1 Stakes (Group 1)</h2>
               <span class="rp-raceTimeCourseName_class">(Class 1)</span>"#,
        );
        assert_eq!(meta.class(), "Group 1");
        assert_eq!(meta.title(), "Example Group 1 Stakes");

        let meta = meta_for(
            r#"<h2 class="rp-raceTimeCourseName__title">Champion Hurdle Challenge Trophy (Grade 1)</h2>"#,
        );
        assert_eq!(meta.class(), "Grade 1");
        assert_eq!(meta.title(), "Champion Hurdle Challenge Trophy");

        let meta = meta_for(
            r#"<h2 class="rp-raceTimeCourseName__title">Sandringham Handicap (Listed Race)</h2>"#,
        );
        assert_eq!(meta.class(), "Listed");
        assert_eq!(meta.title(), "Sandringham Handicap");
    }

    #[test]
    fn class_falls_back_to_class_span() {
        let meta = meta_for(
            r#"<h2 class="rp-raceTimeCourseName__title">Maiden Stakes</h2>
               <span class="rp-raceTimeCourseName_class">(Class 5)</span>"#,
        );
        assert_eq!(meta.class(), "Class 5");
        assert_eq!(meta.band(), "not found");
    }

    #[test]
    fn comma_band_overrides_class() {
        let meta = meta_for(
            r#"<h2 class="rp-raceTimeCourseName__title">Maiden Stakes</h2>
               <span class="rp-raceTimeCourseName_class">(Class 5)</span>
               <span class="rp-raceTimeCourseName_ratingBandAndAgesAllowed">(3yo, Fillies)</span>"#,
        );
        assert_eq!(meta.class(), "3yo");
        assert_eq!(meta.band(), " Fillies");
    }

    #[test]
    fn sex_qualifiers_move_to_band() {
        let band = r#"<span class="rp-raceTimeCourseName_ratingBandAndAgesAllowed">(0-90, 3yo+)</span>"#;

        let meta = meta_for(&format!(
            r#"<h2 class="rp-raceTimeCourseName__title">Handicap (Fillies &amp; Mares)</h2>{band}"#
        ));
        assert_eq!(meta.class(), "0-90");
        assert_eq!(meta.band(), " 3yo+ Fillies & Mares");
        assert_eq!(meta.title(), "Handicap");

        let meta = meta_for(&format!(
            r#"<h2 class="rp-raceTimeCourseName__title">Maiden Stakes (Colts &amp; Geldings)</h2>{band}"#
        ));
        assert_eq!(meta.band(), " 3yo+ Colts & Geldings");
        assert_eq!(meta.title(), "Maiden Stakes");

        // Unbracketed mention: band gains the qualifier, title stays as is.
        let meta = meta_for(
            r#"<h2 class="rp-raceTimeCourseName__title">Fillies' Mile (Group 1)</h2>
               <span class="rp-raceTimeCourseName_ratingBandAndAgesAllowed">(2yo)</span>"#,
        );
        assert_eq!(meta.class(), "Group 1");
        assert_eq!(meta.band(), "2yo Fillies");
        assert_eq!(meta.title(), "Fillies' Mile");
    }

    #[test]
    fn unmatched_allowance_markers_drop_trailing_runners() {
        // Jockey links without the leading marker node halve the jockey list,
        // and assembly keeps only as many runners as that list has.
        let page = RESULT_PAGE
            .replace(
                r#"<a data-test-selector="link-jockeyName"> <sup></sup>"#,
                r#"<a data-test-selector="link-jockeyName">"#,
            )
            .replace(
                r#"<a data-test-selector="link-jockeyName"> <sup>3</sup>"#,
                r#"<a data-test-selector="link-jockeyName">"#,
            );
        let html = Html::parse_document(&page);
        let columns = parse_runners(&html);
        assert_eq!(columns.position.len(), 3);
        assert_eq!(columns.jockey, ["J Doyle"]);
        let (_, runners) = extract(&html, &location());
        assert_eq!(runners.len(), 1);
        assert_eq!(runners[0].name(), "Alpha Centauri");
        assert_eq!(runners[0].jockey(), "J Doyle");
    }

    #[test]
    fn extraction_is_deterministic() {
        let render = || {
            let html = Html::parse_document(RESULT_PAGE);
            let (meta, runners) = extract(&html, &location());
            let mut sink = CsvSink::new(vec![]).unwrap();
            for runner in &runners {
                sink.write(&meta, runner).unwrap();
            }
            sink.into_inner().unwrap()
        };
        assert_eq!(render(), render());
    }
}

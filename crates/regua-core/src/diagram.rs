//! Flowchart synthesis for the communication schedule.
//!
//! [`render`] turns a [`Catalog`] into Mermaid `flowchart` source:
//!
//! - one `D{n}` node per distinct day, chained in ascending order and ending
//!   at the terminal node `D99999`;
//! - for every scheduled entry, the alternative chain of its link drawn below
//!   its day as decision nodes (`{"rule?"}`) and message nodes (`["theme"]`);
//! - `classDef`/`class` lines for day and decision styling, emitted last.
//!
//! Output is a pure function of the catalog and the options, so regenerating
//! from the same data is byte-identical.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::{
  Catalog,
  chain::{LinkLookup, resolve_chain},
  link::ThemeRuleLink,
  schedule::{MAX_DAY, ScheduledDay, TERMINAL_DAY},
};

const INDENT: &str = "    ";
const PLACEHOLDER_ID: &str = "EMPTY";

const DAY_STYLE: &str = "fill:#e8f1fb,stroke:#1f5fa8,stroke-width:2px,color:#0b2545";
const DECISION_STYLE: &str = "fill:#fff4d6,stroke:#b7791f,color:#3d2c00";

// ─── Options ─────────────────────────────────────────────────────────────────

/// Mermaid flowchart orientation.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Direction {
  #[default]
  Lr,
  Rl,
  Td,
  Bt,
}

/// Labels and layout used by [`render`]. Every field has a default, so a
/// partial config section is enough to localise the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramOptions {
  pub direction:         Direction,
  /// Word placed before the day number, e.g. `Day 3`.
  pub day_label:         String,
  pub terminal_label:    String,
  /// Label of the single node drawn when nothing is scheduled.
  pub placeholder_label: String,
  pub yes_label:         String,
  pub no_label:          String,
  /// Used when a theme name cannot be resolved.
  pub theme_fallback:    String,
}

impl Default for DiagramOptions {
  fn default() -> Self {
    Self {
      direction:         Direction::Lr,
      day_label:         "Day".into(),
      terminal_label:    "End".into(),
      placeholder_label: "No days scheduled".into(),
      yes_label:         "Yes".into(),
      no_label:          "No".into(),
      theme_fallback:    "Theme".into(),
    }
  }
}

// ─── Rendering ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Display)]
#[strum(serialize_all = "lowercase")]
enum NodeClass {
  Day,
  Decision,
}

/// One resolved step of an alternative chain.
struct Step {
  theme: String,
  /// `None` when the step's rule is the default sentinel (or missing).
  gate:  Option<String>,
}

/// Render the schedule in `catalog` as Mermaid flowchart source.
///
/// Entries whose link cannot be found, or whose day is outside
/// `0..=MAX_DAY`, are skipped with a warning.
pub fn render(catalog: &Catalog, options: &DiagramOptions) -> String {
  let mut chart = Flowchart::new(options.direction);
  let terminal = day_node_id(TERMINAL_DAY);

  let mut skipped = 0usize;
  let mut by_day: BTreeMap<u32, Vec<&ScheduledDay>> = BTreeMap::new();
  for entry in &catalog.days {
    if entry.day > MAX_DAY {
      tracing::warn!(
        day_id = entry.day_id,
        day = entry.day,
        "skipping scheduled day outside the schedulable range"
      );
      skipped += 1;
      continue;
    }
    by_day.entry(entry.day).or_default().push(entry);
  }
  for entries in by_day.values_mut() {
    entries.sort_by_key(|e| e.day_id);
  }

  if by_day.is_empty() {
    chart.node(PLACEHOLDER_ID, &options.placeholder_label);
    chart.node(&terminal, &options.terminal_label);
    chart.edge(PLACEHOLDER_ID, &terminal);
    chart.classify(NodeClass::Day, PLACEHOLDER_ID);
    chart.classify(NodeClass::Day, &terminal);
    return chart.finish();
  }

  for &day in by_day.keys() {
    let id = day_node_id(day);
    chart.node(&id, &format!("{} {day}", options.day_label));
    chart.classify(NodeClass::Day, &id);
  }
  chart.node(&terminal, &options.terminal_label);
  chart.classify(NodeClass::Day, &terminal);

  let spine: Vec<String> = by_day
    .keys()
    .map(|&d| day_node_id(d))
    .chain(std::iter::once(terminal))
    .collect();
  for pair in spine.windows(2) {
    chart.edge(&pair[0], &pair[1]);
  }

  for (&day, entries) in &by_day {
    for (index, entry) in (1..).zip(entries.iter()) {
      let Some(link) = catalog.link(entry.link_id) else {
        tracing::warn!(
          day_id = entry.day_id,
          link_id = entry.link_id,
          "skipping scheduled day whose link no longer exists"
        );
        skipped += 1;
        continue;
      };
      let steps = resolve_steps(catalog, entry, link, options);
      emit_entry(&mut chart, day, index, &steps, options);
    }
  }

  let out = chart.finish();
  tracing::debug!(
    days = by_day.len(),
    skipped,
    bytes = out.len(),
    "rendered schedule diagram"
  );
  out
}

/// Mermaid id of the node for day `n`.
pub fn day_node_id(n: u32) -> String { format!("D{n}") }

/// Resolve `link`'s chain into drawable steps.
///
/// A step without a real rule always delivers its message, so nothing after
/// it can be reached and the chain is cut there.
fn resolve_steps(
  catalog: &Catalog,
  entry: &ScheduledDay,
  link: &ThemeRuleLink,
  options: &DiagramOptions,
) -> Vec<Step> {
  let mut steps = Vec::new();

  for (depth, step) in resolve_chain(catalog, link).into_iter().enumerate() {
    let snapshot_name = entry.snapshot.theme_name.trim();
    let theme = if depth == 0 && !snapshot_name.is_empty() {
      snapshot_name.to_owned()
    } else {
      catalog
        .theme(step.theme_id)
        .map(|t| t.name.trim())
        .filter(|name| !name.is_empty())
        .unwrap_or(options.theme_fallback.as_str())
        .to_owned()
    };

    let gate = catalog
      .rule(step.rule_id)
      .filter(|r| r.is_gate())
      .map(|r| question(&r.description));

    let last = gate.is_none();
    steps.push(Step { theme, gate });
    if last {
      break;
    }
  }

  steps
}

fn emit_entry(
  chart: &mut Flowchart,
  day: u32,
  index: usize,
  steps: &[Step],
  options: &DiagramOptions,
) {
  let day_id = day_node_id(day);
  let message_id = |depth: usize| format!("ST{day}_{index}_{depth}_T");
  let decision_id = |depth: usize| format!("ST{day}_{index}_{depth}_R");
  let entry_id = |depth: usize| match steps[depth].gate {
    Some(_) => decision_id(depth),
    None => message_id(depth),
  };

  for (depth, step) in steps.iter().enumerate() {
    if let Some(gate) = &step.gate {
      chart.decision(&decision_id(depth), gate);
    }
    chart.node(&message_id(depth), &step.theme);
  }

  if steps.is_empty() {
    return;
  }
  chart.edge(&day_id, &entry_id(0));

  for (depth, step) in steps.iter().enumerate() {
    if step.gate.is_none() {
      continue;
    }
    let fallback = if depth + 1 < steps.len() {
      entry_id(depth + 1)
    } else {
      message_id(depth)
    };
    chart.labeled_edge(&decision_id(depth), &options.yes_label, &message_id(depth));
    chart.labeled_edge(&decision_id(depth), &options.no_label, &fallback);
  }
}

/// Render a rule description as a yes/no question.
fn question(description: &str) -> String {
  let mut q = description.trim().to_owned();
  if !q.ends_with('?') {
    q.push('?');
  }
  q
}

/// Make `label` safe inside a double-quoted Mermaid label.
pub fn sanitize_label(label: &str) -> String {
  label
    .trim()
    .replace("\r\n", "\n")
    .replace('\r', "\n")
    .replace('\n', "<br/>")
    .replace('"', "'")
}

/// Edge labels sit between pipes, so a pipe would end them early.
fn sanitize_edge_label(label: &str) -> String {
  sanitize_label(label).replace('|', "/")
}

// ─── Output builder ──────────────────────────────────────────────────────────

struct Flowchart {
  lines:   Vec<String>,
  classes: BTreeMap<String, Vec<String>>,
}

impl Flowchart {
  fn new(direction: Direction) -> Self {
    Self {
      lines:   vec![format!("flowchart {direction}")],
      classes: BTreeMap::new(),
    }
  }

  fn node(&mut self, id: &str, label: &str) {
    self
      .lines
      .push(format!("{INDENT}{id}[\"{}\"]", sanitize_label(label)));
  }

  fn decision(&mut self, id: &str, label: &str) {
    self
      .lines
      .push(format!("{INDENT}{id}{{\"{}\"}}", sanitize_label(label)));
    self.classify(NodeClass::Decision, id);
  }

  fn edge(&mut self, from: &str, to: &str) {
    self.lines.push(format!("{INDENT}{from} --> {to}"));
  }

  fn labeled_edge(&mut self, from: &str, label: &str, to: &str) {
    self.lines.push(format!(
      "{INDENT}{from} -->|{}| {to}",
      sanitize_edge_label(label)
    ));
  }

  fn classify(&mut self, class: NodeClass, id: &str) {
    self
      .classes
      .entry(class.to_string())
      .or_default()
      .push(id.to_owned());
  }

  fn finish(mut self) -> String {
    self
      .lines
      .push(format!("{INDENT}classDef {} {DAY_STYLE}", NodeClass::Day));
    self.lines.push(format!(
      "{INDENT}classDef {} {DECISION_STYLE}",
      NodeClass::Decision
    ));
    for (class, members) in &self.classes {
      self
        .lines
        .push(format!("{INDENT}class {} {class}", members.join(",")));
    }
    self.lines.join("\n")
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use chrono::{TimeZone, Utc};

  use super::*;
  use crate::{
    link::LinkId,
    rule::{DEFAULT_RULE, Rule},
    schedule::Snapshot,
    theme::Theme,
  };

  const NO_RULE: i64 = 1;

  /// Small in-memory catalog builder.
  struct Fixture {
    themes: Vec<Theme>,
    rules:  Vec<Rule>,
    links:  Vec<ThemeRuleLink>,
    days:   Vec<ScheduledDay>,
  }

  impl Fixture {
    fn new() -> Self {
      Self {
        themes: vec![],
        rules:  vec![Rule { rule_id: NO_RULE, description: DEFAULT_RULE.into() }],
        links:  vec![],
        days:   vec![],
      }
    }

    fn theme(&mut self, name: &str) -> i64 {
      let theme_id = self.themes.len() as i64 + 1;
      self.themes.push(Theme {
        theme_id,
        name: name.into(),
        description: None,
        objective: None,
        journey_id: None,
        alternative_theme_id: None,
      });
      theme_id
    }

    fn rule(&mut self, description: &str) -> i64 {
      let rule_id = self.rules.len() as i64 + 1;
      self.rules.push(Rule { rule_id, description: description.into() });
      rule_id
    }

    fn link(&mut self, theme_id: i64, rule_id: i64, alt: Option<LinkId>) -> LinkId {
      let link_id = self.links.len() as i64 + 1;
      self.links.push(ThemeRuleLink {
        link_id,
        theme_id,
        rule_id,
        alternative_id: alt,
      });
      link_id
    }

    fn set_alternative(&mut self, link_id: LinkId, alt: LinkId) {
      let link = self.links.iter_mut().find(|l| l.link_id == link_id).unwrap();
      link.alternative_id = Some(alt);
    }

    fn schedule(&mut self, day: u32, link_id: LinkId) {
      let day_id = self.days.len() as i64 + 1;
      let snapshot = self
        .links
        .iter()
        .find(|l| l.link_id == link_id)
        .map(|l| Snapshot {
          theme_id: l.theme_id,
          theme_name: self
            .themes
            .iter()
            .find(|t| t.theme_id == l.theme_id)
            .map(|t| t.name.clone())
            .unwrap_or_default(),
          rule_id: l.rule_id,
          ..Snapshot::default()
        })
        .unwrap_or_default();
      self.days.push(ScheduledDay {
        day_id,
        day,
        link_id,
        snapshot,
        captured_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
      });
    }

    fn catalog(&self) -> Catalog {
      Catalog::from_parts(
        vec![],
        self.themes.clone(),
        self.rules.clone(),
        self.links.clone(),
        self.days.clone(),
      )
    }

    fn render(&self) -> String {
      render(&self.catalog(), &DiagramOptions::default())
    }
  }

  fn class_lines() -> String {
    format!(
      "    classDef day {DAY_STYLE}\n    classDef decision {DECISION_STYLE}"
    )
  }

  /// Ids declared as nodes, in order.
  fn declared(out: &str) -> Vec<String> {
    out
      .lines()
      .map(str::trim)
      .filter(|l| !l.contains("-->") && (l.contains("[\"") || l.contains("{\"")))
      .map(|l| l.split(['[', '{']).next().unwrap().to_owned())
      .collect()
  }

  /// `(from, to)` for every edge.
  fn edges(out: &str) -> Vec<(String, String)> {
    out
      .lines()
      .filter_map(|l| l.trim().split_once(" -->"))
      .map(|(from, rest)| {
        let to = rest.rsplit(' ').next().unwrap();
        (from.to_owned(), to.to_owned())
      })
      .collect()
  }

  #[test]
  fn single_default_link_is_wired_directly_from_its_day() {
    let mut f = Fixture::new();
    let welcome = f.theme("Welcome");
    let link = f.link(welcome, NO_RULE, None);
    f.schedule(0, link);

    let expected = format!(
      "flowchart LR
    D0[\"Day 0\"]
    D99999[\"End\"]
    D0 --> D99999
    ST0_1_0_T[\"Welcome\"]
    D0 --> ST0_1_0_T
{}
    class D0,D99999 day",
      class_lines()
    );
    assert_eq!(f.render(), expected);
  }

  #[test]
  fn gated_link_falls_back_to_its_alternative_message() {
    let mut f = Fixture::new();
    let x = f.theme("X");
    let y = f.theme("Y");
    let opened = f.rule("Opened email?");
    let b = f.link(y, NO_RULE, None);
    let a = f.link(x, opened, Some(b));
    f.schedule(3, a);

    let out = f.render();
    assert!(out.contains("    ST3_1_0_R{\"Opened email?\"}\n"), "{out}");
    assert!(!out.contains("Opened email??"));
    assert!(out.contains("    D3 --> ST3_1_0_R\n"));
    assert!(out.contains("    ST3_1_0_R -->|Yes| ST3_1_0_T\n"));
    assert!(out.contains("    ST3_1_0_R -->|No| ST3_1_1_T\n"));
    assert!(out.contains("    ST3_1_0_T[\"X\"]\n"));
    assert!(out.contains("    ST3_1_1_T[\"Y\"]\n"));
    assert!(!out.contains("ST3_1_1_R"));
    assert!(out.ends_with("    class D3,D99999 day\n    class ST3_1_0_R decision"));
  }

  #[test]
  fn empty_schedule_draws_placeholder_and_terminal() {
    let out = Fixture::new().render();
    let expected = format!(
      "flowchart LR
    EMPTY[\"No days scheduled\"]
    D99999[\"End\"]
    EMPTY --> D99999
{}
    class EMPTY,D99999 day",
      class_lines()
    );
    assert_eq!(out, expected);
  }

  #[test]
  fn days_are_chained_in_numeric_order_and_end_at_terminal() {
    let mut f = Fixture::new();
    let t = f.theme("T");
    let link = f.link(t, NO_RULE, None);
    for day in [10, 2, 7, 2] {
      f.schedule(day, link);
    }

    let out = f.render();
    let spine: Vec<_> = edges(&out)
      .into_iter()
      .filter(|(from, to)| from.starts_with('D') && to.starts_with('D'))
      .collect();
    assert_eq!(spine, [
      ("D2".to_owned(), "D7".to_owned()),
      ("D7".to_owned(), "D10".to_owned()),
      ("D10".to_owned(), "D99999".to_owned()),
    ]);
    // Two entries on day 2 get distinct sequence indices.
    assert!(out.contains("D2 --> ST2_1_0_T"));
    assert!(out.contains("D2 --> ST2_2_0_T"));
  }

  #[test]
  fn last_gated_step_falls_back_to_its_own_message() {
    let mut f = Fixture::new();
    let (x, y, z) = (f.theme("X"), f.theme("Y"), f.theme("Z"));
    let (r1, r2, r3) = (f.rule("Clicked"), f.rule("Replied?"), f.rule("Paid"));
    let c = f.link(z, r3, None);
    let b = f.link(y, r2, Some(c));
    let a = f.link(x, r1, Some(b));
    f.schedule(1, a);

    let out = f.render();
    for line in [
      "D1 --> ST1_1_0_R",
      "ST1_1_0_R{\"Clicked?\"}",
      "ST1_1_0_R -->|Yes| ST1_1_0_T",
      "ST1_1_0_R -->|No| ST1_1_1_R",
      "ST1_1_1_R{\"Replied?\"}",
      "ST1_1_1_R -->|Yes| ST1_1_1_T",
      "ST1_1_1_R -->|No| ST1_1_2_R",
      "ST1_1_2_R -->|Yes| ST1_1_2_T",
      "ST1_1_2_R -->|No| ST1_1_2_T",
    ] {
      assert!(out.contains(&format!("    {line}\n")), "missing {line:?} in\n{out}");
    }
    assert!(out.ends_with("class ST1_1_0_R,ST1_1_1_R,ST1_1_2_R decision"));
  }

  #[test]
  fn single_gated_link_uses_a_decision() {
    let mut f = Fixture::new();
    let x = f.theme("X");
    let gate = f.rule("Has app");
    let a = f.link(x, gate, None);
    f.schedule(5, a);

    let out = f.render();
    assert!(out.contains("    D5 --> ST5_1_0_R\n"));
    assert!(out.contains("    ST5_1_0_R -->|Yes| ST5_1_0_T\n"));
    assert!(out.contains("    ST5_1_0_R -->|No| ST5_1_0_T\n"));
  }

  #[test]
  fn chain_is_cut_after_the_first_ungated_step() {
    let mut f = Fixture::new();
    let (x, y, z) = (f.theme("X"), f.theme("Y"), f.theme("Z"));
    let gate = f.rule("Opened");
    let c = f.link(z, gate, None);
    let b = f.link(y, NO_RULE, Some(c));
    let a = f.link(x, gate, Some(b));
    f.schedule(0, a);

    let out = f.render();
    assert!(out.contains("ST0_1_0_R -->|No| ST0_1_1_T"));
    assert!(!out.contains("ST0_1_2"));
    assert!(!out.contains("\"Z\""));
  }

  #[test]
  fn cyclic_alternatives_do_not_loop() {
    let mut f = Fixture::new();
    let (x, y) = (f.theme("X"), f.theme("Y"));
    let gate = f.rule("Opened");
    let a = f.link(x, gate, None);
    let b = f.link(y, gate, Some(a));
    f.set_alternative(a, b);
    f.schedule(0, a);

    let out = f.render();
    assert!(out.contains("ST0_1_0_R -->|No| ST0_1_1_R"));
    assert!(out.contains("ST0_1_1_R -->|No| ST0_1_1_T"));
    assert!(!out.contains("ST0_1_2"));
  }

  #[test]
  fn missing_links_are_skipped() {
    let mut f = Fixture::new();
    let x = f.theme("X");
    let a = f.link(x, NO_RULE, None);
    f.schedule(1, 42);
    f.schedule(2, a);

    let out = f.render();
    assert!(out.contains("    D1[\"Day 1\"]\n"));
    assert!(out.contains("    D1 --> D2\n"));
    assert!(!out.contains("ST1_1"));
    assert!(out.contains("    D2 --> ST2_1_0_T\n"));
  }

  #[test]
  fn terminal_day_entries_are_skipped() {
    let mut f = Fixture::new();
    let x = f.theme("X");
    let a = f.link(x, NO_RULE, None);
    f.schedule(TERMINAL_DAY, a);

    let out = f.render();
    assert!(!out.contains("D99999 --> D99999"), "{out}");
    assert_eq!(out.matches("D99999[").count(), 1);
    assert_eq!(out, Fixture::new().render());

    f.schedule(4, a);
    let out = f.render();
    assert!(!out.contains("D99999 --> D99999"), "{out}");
    assert!(out.contains("    D4 --> D99999\n"));
    assert!(!out.contains("ST99999"));
  }

  #[test]
  fn labels_are_sanitized() {
    let mut f = Fixture::new();
    let x = f.theme("Say \"hi\"\nthen wait");
    let gate = f.rule("Line one\r\nline \"two\"");
    let a = f.link(x, gate, None);
    f.schedule(0, a);

    let out = f.render();
    assert!(out.contains("ST0_1_0_T[\"Say 'hi'<br/>then wait\"]"), "{out}");
    assert!(out.contains("ST0_1_0_R{\"Line one<br/>line 'two'?\"}"), "{out}");
    for line in out.lines().skip(1) {
      let quotes = line.matches('"').count();
      assert!(quotes == 0 || quotes == 2, "{line}");
    }
  }

  #[test]
  fn snapshot_name_labels_the_scheduled_step() {
    let mut f = Fixture::new();
    let x = f.theme("Original name");
    let a = f.link(x, NO_RULE, None);
    f.schedule(0, a);
    f.themes[0].name = "Renamed".into();

    let out = f.render();
    assert!(out.contains("[\"Original name\"]"));
    assert!(!out.contains("Renamed"));
  }

  #[test]
  fn rendering_is_deterministic() {
    let mut f = Fixture::new();
    let (x, y) = (f.theme("X"), f.theme("Y"));
    let gate = f.rule("Opened");
    let b = f.link(y, NO_RULE, None);
    let a = f.link(x, gate, Some(b));
    for day in [4, 0, 4, 9] {
      f.schedule(day, a);
      f.schedule(day, b);
    }

    let mut catalog = f.catalog();
    let first = render(&catalog, &DiagramOptions::default());
    catalog.days.reverse();
    let second = render(&catalog, &DiagramOptions::default());
    assert_eq!(first, second);
  }

  #[test]
  fn every_node_is_connected() {
    let mut f = Fixture::new();
    let (x, y, z) = (f.theme("X"), f.theme("Y"), f.theme("Z"));
    let gate = f.rule("Opened");
    let c = f.link(z, NO_RULE, None);
    let b = f.link(y, gate, Some(c));
    let a = f.link(x, gate, Some(b));
    f.schedule(0, a);
    f.schedule(0, c);
    f.schedule(3, b);

    let out = f.render();
    let targets: BTreeSet<_> = edges(&out).into_iter().map(|(_, to)| to).collect();
    let nodes = declared(&out);
    assert_eq!(nodes[0], "D0");
    for node in &nodes[1..] {
      assert!(targets.contains(node), "{node} has no incoming edge\n{out}");
    }
  }

  #[test]
  fn options_localise_labels() {
    let mut f = Fixture::new();
    let x = f.theme("Boas-vindas");
    let gate = f.rule("Abriu o e-mail");
    let a = f.link(x, gate, None);
    f.schedule(1, a);

    let options = DiagramOptions {
      direction: Direction::Td,
      day_label: "Dia".into(),
      terminal_label: "Fim".into(),
      yes_label: "Sim".into(),
      no_label: "Não".into(),
      ..DiagramOptions::default()
    };
    let out = render(&f.catalog(), &options);
    assert!(out.starts_with("flowchart TD\n    D1[\"Dia 1\"]\n    D99999[\"Fim\"]\n"));
    assert!(out.contains("-->|Sim|"));
    assert!(out.contains("-->|Não|"));
  }
}

use crate::output::{print_json, print_table};
use wizard_core::steps;

pub fn run(json: bool) -> anyhow::Result<()> {
    let infos: Vec<steps::StepInfo> = steps::registry()
        .iter()
        .enumerate()
        .map(|(i, s)| s.info(i))
        .collect();

    if json {
        return print_json(&serde_json::json!({ "steps": infos }));
    }

    let rows = infos
        .iter()
        .map(|s| {
            vec![
                (s.index + 1).to_string(),
                s.id.to_string(),
                s.name.to_string(),
                s.agent.to_string(),
                s.output_key.to_string(),
                if s.in_document { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    print_table(&["#", "ID", "NAME", "AGENT", "OUTPUT", "IN DOC"], rows);
    Ok(())
}

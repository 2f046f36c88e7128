use crate::error::Result;
use crate::scenarios;

pub fn list_scenarios(porcelain: bool, json: bool) -> Result<()> {
    let scenarios = scenarios::all();

    if json {
        let entries: Vec<_> = scenarios
            .iter()
            .map(|scenario| {
                serde_json::json!({
                    "name": scenario.name,
                    "description": scenario.description,
                })
            })
            .collect();

        println!("{}", serde_json::to_string(&entries)?);
    } else if porcelain {
        for scenario in scenarios {
            println!("{}\t{}", scenario.name, scenario.description);
        }
    } else {
        let name_width = scenarios
            .iter()
            .map(|s| s.name.len())
            .max()
            .unwrap_or(0)
            .max(16);

        println!("{:<width$}DESCRIPTION", "SCENARIO", width = name_width + 2);
        println!("{}", "─".repeat(name_width + 2 + 48));

        for scenario in scenarios {
            println!(
                "{:<width$}{}",
                scenario.name,
                scenario.description,
                width = name_width + 2
            );
        }
    }

    Ok(())
}

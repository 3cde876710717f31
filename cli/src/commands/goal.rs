use anyhow::{Result, bail};

use stride_core::models::Goals;
use stride_core::session::Session;

use super::helpers::print_json;

pub(crate) fn cmd_goal_set(
    session: &Session,
    intake: Option<f64>,
    burn: Option<f64>,
    json: bool,
) -> Result<()> {
    if intake.is_none() && burn.is_none() {
        bail!("Nothing to set. Pass --intake and/or --burn");
    }
    let current = session.goals()?;
    let goals = Goals {
        intake_kcal: intake.unwrap_or(current.intake_kcal),
        burn_kcal: burn.unwrap_or(current.burn_kcal),
    };
    session.set_goals(&goals)?;

    if json {
        print_json(&goals)
    } else {
        print_goals(&goals);
        Ok(())
    }
}

pub(crate) fn cmd_goal_show(session: &Session, json: bool) -> Result<()> {
    let goals = session.goals()?;
    if json {
        print_json(&goals)
    } else {
        print_goals(&goals);
        Ok(())
    }
}

fn print_goals(goals: &Goals) {
    println!("Target intake: {:.0} kcal/day", goals.intake_kcal);
    println!("Target burn:   {:.0} kcal/day", goals.burn_kcal);
}

mod goal;
mod helpers;
mod log;
mod predict;
mod summary;
mod transfer;

pub(crate) use goal::{cmd_goal_set, cmd_goal_show};
pub(crate) use log::{cmd_eat, cmd_log, cmd_walk};
pub(crate) use predict::cmd_predict;
pub(crate) use summary::{cmd_history, cmd_show, cmd_week};
pub(crate) use transfer::{cmd_export, cmd_import};

pub mod astar;
pub mod dispatch;

//! different utility modules used throughout the project
/// tiny module to save matrices and purification reports into csv files and read them back
pub mod data_io;
/// parse document with structure like " purification equation: ... variables: x, y threshold: 0.01" into a typed task
pub mod task_parser;

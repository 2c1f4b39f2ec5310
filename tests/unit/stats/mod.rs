pub mod multitest;

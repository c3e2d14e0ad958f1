mod conv;
mod others;

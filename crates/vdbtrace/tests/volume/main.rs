mod builder;
mod hit_iterator;
mod interval_iterator;
mod volume;

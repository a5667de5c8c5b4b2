mod combiner;
mod mixed;
mod unmixed;

mod find;
mod interaction;
mod view;

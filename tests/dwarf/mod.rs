mod line_program_test;

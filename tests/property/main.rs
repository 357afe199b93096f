mod relationships;
